use std::collections::HashSet;

use rusqlite::{params, params_from_iter, Connection};

use crate::error::Result;
use crate::models::{Link, SentenceId};

use super::placeholders;

pub trait LinkRepository {
    /// Every row where any of `ids` is on either end, in row-id order.
    fn touching(&self, ids: &[SentenceId]) -> Result<Vec<Link>>;
    /// Directed edges incident to `id`.
    fn edges_of(&self, id: SentenceId) -> Result<HashSet<(SentenceId, SentenceId)>>;
    fn from_sentence(&self, id: SentenceId) -> Result<Vec<Link>>;
    fn to_sentence(&self, id: SentenceId) -> Result<Vec<Link>>;
    fn insert(&self, sentence_id: SentenceId, translation_id: SentenceId) -> Result<i64>;
    /// Inserts both directions of a translation pair.
    fn insert_pair(&self, a: SentenceId, b: SentenceId) -> Result<()>;
    fn delete(&self, link_id: i64) -> Result<bool>;
}

pub struct SqliteLinkRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteLinkRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_link(row: &rusqlite::Row) -> rusqlite::Result<Link> {
        Ok(Link {
            id: row.get(0)?,
            sentence_id: row.get(1)?,
            translation_id: row.get(2)?,
        })
    }

    fn query(&self, sql: &str, id: SentenceId) -> Result<Vec<Link>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![id], Self::row_to_link)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl<'a> LinkRepository for SqliteLinkRepository<'a> {
    fn touching(&self, ids: &[SentenceId]) -> Result<Vec<Link>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let marks = placeholders(ids.len());
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, sentence_id, translation_id FROM sentences_translations
             WHERE sentence_id IN ({marks}) OR translation_id IN ({marks})
             ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), Self::row_to_link)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn edges_of(&self, id: SentenceId) -> Result<HashSet<(SentenceId, SentenceId)>> {
        let rows = self.query(
            "SELECT id, sentence_id, translation_id FROM sentences_translations
             WHERE sentence_id = ?1 OR translation_id = ?1",
            id,
        )?;
        Ok(rows.iter().map(Link::edge).collect())
    }

    fn from_sentence(&self, id: SentenceId) -> Result<Vec<Link>> {
        self.query(
            "SELECT id, sentence_id, translation_id FROM sentences_translations
             WHERE sentence_id = ?1 ORDER BY translation_id",
            id,
        )
    }

    fn to_sentence(&self, id: SentenceId) -> Result<Vec<Link>> {
        self.query(
            "SELECT id, sentence_id, translation_id FROM sentences_translations
             WHERE translation_id = ?1 ORDER BY sentence_id",
            id,
        )
    }

    fn insert(&self, sentence_id: SentenceId, translation_id: SentenceId) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sentences_translations (sentence_id, translation_id) VALUES (?1, ?2)",
            params![sentence_id, translation_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_pair(&self, a: SentenceId, b: SentenceId) -> Result<()> {
        self.insert(a, b)?;
        self.insert(b, a)?;
        Ok(())
    }

    fn delete(&self, link_id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sentences_translations WHERE id = ?1", params![link_id])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    #[test]
    fn test_insert_pair_and_lookup() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let repo = SqliteLinkRepository::new(&conn);
        repo.insert_pair(6, 9).unwrap();
        repo.insert_pair(7, 10).unwrap();

        let forward: Vec<_> = repo.from_sentence(6).unwrap().iter().map(Link::edge).collect();
        assert_eq!(forward, vec![(6, 9)]);
        let backward: Vec<_> = repo.to_sentence(6).unwrap().iter().map(Link::edge).collect();
        assert_eq!(backward, vec![(9, 6)]);

        assert_eq!(repo.touching(&[6, 7]).unwrap().len(), 4);
        assert_eq!(repo.edges_of(10).unwrap(), HashSet::from([(7, 10), (10, 7)]));
    }

    #[test]
    fn test_duplicate_edge_is_a_constraint_violation() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let repo = SqliteLinkRepository::new(&conn);
        repo.insert(1, 2).unwrap();
        assert!(repo.insert(1, 2).unwrap_err().is_constraint_violation());
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let repo = SqliteLinkRepository::new(&conn);
        let id = repo.insert(1, 2).unwrap();
        assert!(repo.delete(id).unwrap());
        assert!(repo.touching(&[1]).unwrap().is_empty());
    }
}
