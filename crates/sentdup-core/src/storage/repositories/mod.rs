mod comment_repository;
mod contribution_repository;
mod link_repository;
mod relation_repository;
mod sentence_repository;
mod user_repository;
mod wall_repository;

pub use comment_repository::{CommentRepository, SqliteCommentRepository};
pub use contribution_repository::{ContributionRepository, SqliteContributionRepository};
pub use link_repository::{LinkRepository, SqliteLinkRepository};
pub use relation_repository::{RelationRepository, RelationRow, RowKey, SqliteRelationRepository};
pub use sentence_repository::{SentenceRepository, SqliteSentenceRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};
pub use wall_repository::{SqliteWallRepository, WallRepository};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn save(&self, entity: &Self::Entity) -> Result<()>;
    fn delete(&self, id: &Self::Id) -> Result<bool>;
}

/// `?1, ?2, ... ?n` for an `IN (...)` clause; `n` must be at least 1.
pub(crate) fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

/// Maps a stored timestamp column, surfacing bad text as a conversion error.
pub(crate) fn timestamp_column(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    let raw: String = row.get(idx)?;
    crate::models::from_db_timestamp(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?1");
        assert_eq!(placeholders(3), "?1, ?2, ?3");
    }
}
