pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, DatabaseConfig, DedupConfig, LoggingConfig};
pub use error::{CoreError, ExitCode, Result};
pub use models::*;

pub use storage::database::Database;

pub use storage::repositories::{
    CommentRepository, ContributionRepository, LinkRepository, RelationRepository,
    RelationRow, Repository, RowKey, SentenceRepository, SqliteCommentRepository,
    SqliteContributionRepository, SqliteLinkRepository, SqliteRelationRepository,
    SqliteSentenceRepository, SqliteUserRepository, SqliteWallRepository, UserRepository,
    WallRepository,
};
