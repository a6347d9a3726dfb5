use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// A post on the community wall. Threads are kept as a nested-set tree (`lft`/`rght`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallPost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,

    pub date: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub lft: i64,
    pub rght: i64,
}
