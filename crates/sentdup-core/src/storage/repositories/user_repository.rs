use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{to_db_timestamp, UserId};

pub trait UserRepository {
    fn find_by_name(&self, username: &str) -> Result<Option<UserId>>;
    fn get_or_create(&self, username: &str, at: &DateTime<Utc>) -> Result<UserId>;
}

pub struct SqliteUserRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteUserRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> UserRepository for SqliteUserRepository<'a> {
    fn find_by_name(&self, username: &str) -> Result<Option<UserId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn get_or_create(&self, username: &str, at: &DateTime<Utc>) -> Result<UserId> {
        if let Some(id) = self.find_by_name(username)? {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO users (username, created) VALUES (?1, ?2)",
            params![username, to_db_timestamp(at)],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now_secs;
    use crate::storage::database::Database;

    #[test]
    fn test_get_or_create_is_stable() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let repo = SqliteUserRepository::new(&conn);
        let now = now_secs();

        assert_eq!(repo.find_by_name("dedup-bot").unwrap(), None);
        let first = repo.get_or_create("dedup-bot", &now).unwrap();
        let second = repo.get_or_create("dedup-bot", &now).unwrap();
        assert_eq!(first, second);
        assert_eq!(repo.find_by_name("dedup-bot").unwrap(), Some(first));
    }
}
