use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SentenceId, UserId};

/// A comment attached to a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub sentence_id: SentenceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    pub text: String,
    pub created: DateTime<Utc>,
}

impl Comment {
    pub fn new(sentence_id: SentenceId, user_id: Option<UserId>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            sentence_id,
            user_id,
            text: text.into(),
            created: super::now_secs(),
        }
    }
}
