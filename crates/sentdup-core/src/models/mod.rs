pub mod comment;
pub mod contribution;
pub mod link;
pub mod relation;
pub mod sentence;
pub mod wall;

pub use comment::*;
pub use contribution::*;
pub use link::*;
pub use relation::*;
pub use sentence::*;
pub use wall::*;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Current time truncated to whole seconds, the precision timestamps are stored at.
pub fn now_secs() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Timestamps are stored as fixed-width RFC 3339 UTC text so they compare lexically.
pub fn to_db_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn from_db_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}
