use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SentenceId = i64;
pub type UserId = i64;

/// Moderation status of a sentence. Ordered so that `Approved` compares highest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
    Rejected,
    #[default]
    Unreviewed,
    Approved,
}

impl Correctness {
    /// Stored as -1 / 0 / 1. Anything above zero counts as approved.
    pub fn from_db(value: i64) -> Self {
        match value {
            v if v < 0 => Self::Rejected,
            0 => Self::Unreviewed,
            _ => Self::Approved,
        }
    }

    pub fn as_db(self) -> i64 {
        match self {
            Self::Rejected => -1,
            Self::Unreviewed => 0,
            Self::Approved => 1,
        }
    }
}

impl std::fmt::Display for Correctness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected => write!(f, "rejected"),
            Self::Unreviewed => write!(f, "unreviewed"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

/// A deduplicable sentence record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: SentenceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    #[serde(default)]
    pub has_audio: bool,

    #[serde(default)]
    pub correctness: Correctness,

    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Sentence {
    pub fn new(id: SentenceId, lang: impl Into<String>, text: impl Into<String>) -> Self {
        let now = super::now_secs();
        Self {
            id,
            lang: Some(lang.into()),
            text: text.into(),
            user_id: None,
            has_audio: false,
            correctness: Correctness::default(),
            created: now,
            modified: now,
        }
    }

    pub fn with_owner(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_audio(mut self) -> Self {
        self.has_audio = true;
        self
    }

    pub fn with_correctness(mut self, correctness: Correctness) -> Self {
        self.correctness = correctness;
        self
    }

    pub fn with_dates(mut self, created: DateTime<Utc>, modified: DateTime<Utc>) -> Self {
        self.created = created;
        self.modified = modified;
        self
    }

    pub fn has_owner(&self) -> bool {
        self.user_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correctness_ordering() {
        assert!(Correctness::Approved > Correctness::Unreviewed);
        assert!(Correctness::Unreviewed > Correctness::Rejected);
    }

    #[test]
    fn test_correctness_db_mapping() {
        assert_eq!(Correctness::from_db(-1), Correctness::Rejected);
        assert_eq!(Correctness::from_db(0), Correctness::Unreviewed);
        assert_eq!(Correctness::from_db(1), Correctness::Approved);
        assert_eq!(Correctness::Rejected.as_db(), -1);
    }

    #[test]
    fn test_sentence_builders() {
        let s = Sentence::new(3, "eng", "Hi.").with_owner(7).with_audio();
        assert!(s.has_owner());
        assert!(s.has_audio);
        assert_eq!(s.correctness, Correctness::Unreviewed);
    }
}
