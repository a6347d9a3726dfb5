use sentdup_core::{CoreError, Relation};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("empty time expression")]
    Empty,

    #[error("malformed number in `{0}`")]
    MalformedNumber(String),

    #[error("unknown time unit in `{0}` (expected y, m, d, h, min or s)")]
    UnknownUnit(String),

    #[error("`ago` may only appear as the last token")]
    MisplacedAgo,

    #[error("invalid date: {0}")]
    InvalidDate(String),
}

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("invalid time window: {0}")]
    Parse(#[from] TimeParseError),

    #[error(transparent)]
    Store(#[from] CoreError),

    #[error("{relation} has no sentence field named `{field}`")]
    UnknownField { relation: Relation, field: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for DedupError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(CoreError::from(err))
    }
}

impl DedupError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_constraint_violation())
    }
}

pub type Result<T> = std::result::Result<T, DedupError>;
