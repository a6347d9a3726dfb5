use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::{to_db_timestamp, Comment, SentenceId};

use super::timestamp_column;

pub trait CommentRepository {
    fn list_for(&self, sentence_id: SentenceId) -> Result<Vec<Comment>>;
    fn insert(&self, comment: &Comment) -> Result<i64>;
    fn delete_for(&self, sentence_id: SentenceId) -> Result<usize>;
    fn find_containing(&self, needle: &str) -> Result<Vec<Comment>>;
}

pub struct SqliteCommentRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCommentRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: row.get(0)?,
            sentence_id: row.get(1)?,
            user_id: row.get(2)?,
            text: row.get(3)?,
            created: timestamp_column(row, 4)?,
        })
    }
}

impl<'a> CommentRepository for SqliteCommentRepository<'a> {
    fn list_for(&self, sentence_id: SentenceId) -> Result<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sentence_id, user_id, text, created FROM sentence_comments
             WHERE sentence_id = ?1 ORDER BY created, id",
        )?;
        let rows = stmt
            .query_map(params![sentence_id], Self::row_to_comment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert(&self, comment: &Comment) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sentence_comments (sentence_id, user_id, text, created)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                comment.sentence_id,
                comment.user_id,
                comment.text,
                to_db_timestamp(&comment.created),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn delete_for(&self, sentence_id: SentenceId) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM sentence_comments WHERE sentence_id = ?1",
            params![sentence_id],
        )?;
        Ok(deleted)
    }

    fn find_containing(&self, needle: &str) -> Result<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sentence_id, user_id, text, created FROM sentence_comments
             WHERE instr(text, ?1) > 0 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![needle], Self::row_to_comment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
