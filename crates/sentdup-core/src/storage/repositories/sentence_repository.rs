use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{to_db_timestamp, Correctness, Sentence, SentenceId};

use super::{placeholders, timestamp_column, Repository};

pub trait SentenceRepository: Repository<Entity = Sentence, Id = SentenceId> {
    /// Highest sentence id, or 0 for an empty table.
    fn max_id(&self) -> Result<SentenceId>;
    /// Sentences with `start <= id <= end`, optionally only those modified at or after
    /// `since`, in ascending id order.
    fn scan_range(
        &self,
        start: SentenceId,
        end: SentenceId,
        since: Option<&DateTime<Utc>>,
    ) -> Result<Vec<Sentence>>;
    fn find_many(&self, ids: &[SentenceId]) -> Result<Vec<Sentence>>;
    fn existing_ids(&self, ids: &[SentenceId]) -> Result<Vec<SentenceId>>;
}

pub struct SqliteSentenceRepository<'a> {
    conn: &'a Connection,
}

const COLUMNS: &str = "id, lang, text, user_id, has_audio, correctness, created, modified";

impl<'a> SqliteSentenceRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_sentence(row: &rusqlite::Row) -> rusqlite::Result<Sentence> {
        Ok(Sentence {
            id: row.get(0)?,
            lang: row.get(1)?,
            text: row.get(2)?,
            user_id: row.get(3)?,
            has_audio: row.get(4)?,
            correctness: Correctness::from_db(row.get(5)?),
            created: timestamp_column(row, 6)?,
            modified: timestamp_column(row, 7)?,
        })
    }
}

impl<'a> Repository for SqliteSentenceRepository<'a> {
    type Entity = Sentence;
    type Id = SentenceId;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let sentence = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM sentences WHERE id = ?1"),
                params![id],
                Self::row_to_sentence,
            )
            .optional()?;
        Ok(sentence)
    }

    fn save(&self, sentence: &Self::Entity) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sentences
                (id, lang, text, user_id, has_audio, correctness, created, modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                sentence.id,
                sentence.lang,
                sentence.text,
                sentence.user_id,
                sentence.has_audio,
                sentence.correctness.as_db(),
                to_db_timestamp(&sentence.created),
                to_db_timestamp(&sentence.modified),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM sentences WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> SentenceRepository for SqliteSentenceRepository<'a> {
    fn max_id(&self) -> Result<SentenceId> {
        let max: Option<SentenceId> =
            self.conn.query_row("SELECT MAX(id) FROM sentences", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0))
    }

    fn scan_range(
        &self,
        start: SentenceId,
        end: SentenceId,
        since: Option<&DateTime<Utc>>,
    ) -> Result<Vec<Sentence>> {
        let rows = match since {
            Some(cutoff) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM sentences
                     WHERE id BETWEEN ?1 AND ?2 AND modified >= ?3
                     ORDER BY id"
                ))?;
                stmt.query_map(
                    params![start, end, to_db_timestamp(cutoff)],
                    Self::row_to_sentence,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM sentences WHERE id BETWEEN ?1 AND ?2 ORDER BY id"
                ))?;
                stmt.query_map(params![start, end], Self::row_to_sentence)?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    fn find_many(&self, ids: &[SentenceId]) -> Result<Vec<Sentence>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM sentences WHERE id IN ({}) ORDER BY id",
            placeholders(ids.len())
        ))?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), Self::row_to_sentence)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn existing_ids(&self, ids: &[SentenceId]) -> Result<Vec<SentenceId>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id FROM sentences WHERE id IN ({}) ORDER BY id",
            placeholders(ids.len())
        ))?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_save_and_find() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let repo = SqliteSentenceRepository::new(&conn);

        let s = Sentence::new(5, "eng", "Hello.")
            .with_owner(2)
            .with_correctness(Correctness::Rejected)
            .with_dates(at(1), at(2));
        repo.save(&s).unwrap();

        assert_eq!(repo.find_by_id(&5).unwrap(), Some(s));
        assert_eq!(repo.find_by_id(&6).unwrap(), None);
    }

    #[test]
    fn test_max_id_on_empty_table() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        assert_eq!(SqliteSentenceRepository::new(&conn).max_id().unwrap(), 0);
    }

    #[test]
    fn test_scan_range_with_cutoff() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let repo = SqliteSentenceRepository::new(&conn);
        for id in 1..=6 {
            let day = id as u32;
            repo.save(&Sentence::new(id, "eng", format!("s{id}")).with_dates(at(1), at(day)))
                .unwrap();
        }

        let all: Vec<_> = repo.scan_range(2, 5, None).unwrap().iter().map(|s| s.id).collect();
        assert_eq!(all, vec![2, 3, 4, 5]);

        let cutoff = at(4);
        let recent: Vec<_> = repo
            .scan_range(1, 6, Some(&cutoff))
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(recent, vec![4, 5, 6]);
        assert_eq!(repo.max_id().unwrap(), 6);
    }

    #[test]
    fn test_find_many_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let repo = SqliteSentenceRepository::new(&conn);
        for id in [3, 1, 2] {
            repo.save(&Sentence::new(id, "fra", "Salut.")).unwrap();
        }

        let found: Vec<_> = repo.find_many(&[2, 3, 9]).unwrap().iter().map(|s| s.id).collect();
        assert_eq!(found, vec![2, 3]);

        assert!(repo.delete(&2).unwrap());
        assert!(!repo.delete(&2).unwrap());
        assert_eq!(repo.existing_ids(&[1, 2, 3]).unwrap(), vec![1, 3]);
        assert!(repo.find_many(&[]).unwrap().is_empty());
    }
}
