use rusqlite::ErrorCode;
use thiserror::Error;

/// All errors that can occur in sentdup-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Database schema version {found} is newer than the supported {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CoreError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, CoreError::ConstraintViolation(_))
    }
}

// Uniqueness and CHECK failures get their own variant so merge callers can tell a
// conflicting row apart from a broken store.
impl From<rusqlite::Error> for CoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref code, ref message)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                CoreError::ConstraintViolation(
                    message.clone().unwrap_or_else(|| code.to_string()),
                )
            }
            other => CoreError::Database(other),
        }
    }
}

/// Process exit codes for the `sentdup` binary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidArgs = 3,
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_unique_failure_maps_to_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k INTEGER UNIQUE); INSERT INTO t VALUES (1);")
            .unwrap();
        let err: CoreError = conn
            .execute("INSERT INTO t VALUES (1)", [])
            .unwrap_err()
            .into();
        assert!(err.is_constraint_violation());
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[test]
    fn test_other_failures_stay_database_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err: CoreError = conn.execute("SELECT * FROM missing", []).unwrap_err().into();
        assert!(matches!(err, CoreError::Database(_)));
    }
}
