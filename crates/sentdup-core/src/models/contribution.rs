use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Sentence, SentenceId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionAction {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for ContributionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl std::str::FromStr for ContributionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(format!("Invalid ContributionAction: {s}")),
        }
    }
}

/// What a contribution row is about. Stored in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionKind {
    Sentence,
    Link,
}

impl std::fmt::Display for ContributionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sentence => write!(f, "sentence"),
            Self::Link => write!(f, "link"),
        }
    }
}

impl std::str::FromStr for ContributionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sentence" => Ok(Self::Sentence),
            "link" => Ok(Self::Link),
            _ => Err(format!("Invalid ContributionKind: {s}")),
        }
    }
}

/// Append-only audit entry. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub sentence_id: SentenceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_lang: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_id: Option<SentenceId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_lang: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    pub action: ContributionAction,
    pub kind: ContributionKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    pub datetime: DateTime<Utc>,

    /// Survivor a deleted sentence was folded into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_into: Option<SentenceId>,
}

impl Contribution {
    pub fn link(
        action: ContributionAction,
        sentence_id: SentenceId,
        translation_id: SentenceId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            sentence_id,
            sentence_lang: None,
            translation_id: Some(translation_id),
            translation_lang: None,
            text: None,
            action,
            kind: ContributionKind::Link,
            user_id: None,
            datetime: at,
            merged_into: None,
        }
    }

    pub fn sentence_deleted(sentence: &Sentence, survivor: SentenceId, at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            sentence_id: sentence.id,
            sentence_lang: sentence.lang.clone(),
            translation_id: None,
            translation_lang: None,
            text: Some(sentence.text.clone()),
            action: ContributionAction::Delete,
            kind: ContributionKind::Sentence,
            user_id: None,
            datetime: at,
            merged_into: Some(survivor),
        }
    }

    pub fn by(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }
}
