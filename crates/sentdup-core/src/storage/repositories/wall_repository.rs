use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::{to_db_timestamp, UserId, WallPost};

use super::timestamp_column;

pub trait WallRepository {
    /// Appends a new thread root after every existing tree.
    fn append_root(
        &self,
        owner: Option<UserId>,
        title: &str,
        content: &str,
        at: &DateTime<Utc>,
    ) -> Result<WallPost>;
    fn list(&self) -> Result<Vec<WallPost>>;
}

pub struct SqliteWallRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteWallRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> WallRepository for SqliteWallRepository<'a> {
    fn append_root(
        &self,
        owner: Option<UserId>,
        title: &str,
        content: &str,
        at: &DateTime<Utc>,
    ) -> Result<WallPost> {
        let max_rght: i64 =
            self.conn
                .query_row("SELECT COALESCE(MAX(rght), 0) FROM wall", [], |row| row.get(0))?;
        let lft = max_rght + 1;
        let rght = lft + 1;
        let stamp = to_db_timestamp(at);

        self.conn.execute(
            "INSERT INTO wall (owner, parent_id, date, title, content, lft, rght, modified)
             VALUES (?1, NULL, ?2, ?3, ?4, ?5, ?6, ?2)",
            params![owner, stamp, title, content, lft, rght],
        )?;

        Ok(WallPost {
            id: Some(self.conn.last_insert_rowid()),
            owner,
            parent_id: None,
            date: *at,
            title: title.to_string(),
            content: content.to_string(),
            lft,
            rght,
        })
    }

    fn list(&self) -> Result<Vec<WallPost>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, parent_id, date, title, content, lft, rght FROM wall ORDER BY lft",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(WallPost {
                    id: row.get(0)?,
                    owner: row.get(1)?,
                    parent_id: row.get(2)?,
                    date: timestamp_column(row, 3)?,
                    title: row.get(4)?,
                    content: row.get(5)?,
                    lft: row.get(6)?,
                    rght: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now_secs;
    use crate::storage::database::Database;

    #[test]
    fn test_roots_are_appended_in_nested_set_order() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let repo = SqliteWallRepository::new(&conn);
        let now = now_secs();

        let first = repo.append_root(None, "", "first", &now).unwrap();
        let second = repo.append_root(Some(4), "", "second", &now).unwrap();
        assert_eq!((first.lft, first.rght), (1, 2));
        assert_eq!((second.lft, second.rght), (3, 4));

        let posts = repo.list().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].owner, Some(4));
    }
}
