use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::{
    to_db_timestamp, Contribution, ContributionAction, ContributionKind, SentenceId,
};

use super::timestamp_column;

/// The audit log is append-only: there is deliberately no update or delete here.
pub trait ContributionRepository {
    fn append(&self, contribution: &Contribution) -> Result<i64>;
    fn list_for_sentence(&self, sentence_id: SentenceId) -> Result<Vec<Contribution>>;
    fn list_by(&self, kind: ContributionKind, action: ContributionAction) -> Result<Vec<Contribution>>;
}

pub struct SqliteContributionRepository<'a> {
    conn: &'a Connection,
}

const COLUMNS: &str = "id, sentence_id, sentence_lang, translation_id, translation_lang, text,
                       action, type, user_id, datetime, merged_into";

impl<'a> SqliteContributionRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_contribution(row: &rusqlite::Row) -> rusqlite::Result<Contribution> {
        let action: String = row.get(6)?;
        let kind: String = row.get(7)?;
        let conversion = |idx: usize, msg: String| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                msg.into(),
            )
        };

        Ok(Contribution {
            id: row.get(0)?,
            sentence_id: row.get(1)?,
            sentence_lang: row.get(2)?,
            translation_id: row.get(3)?,
            translation_lang: row.get(4)?,
            text: row.get(5)?,
            action: ContributionAction::from_str(&action).map_err(|e| conversion(6, e))?,
            kind: ContributionKind::from_str(&kind).map_err(|e| conversion(7, e))?,
            user_id: row.get(8)?,
            datetime: timestamp_column(row, 9)?,
            merged_into: row.get(10)?,
        })
    }
}

impl<'a> ContributionRepository for SqliteContributionRepository<'a> {
    fn append(&self, c: &Contribution) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO contributions
                (sentence_id, sentence_lang, translation_id, translation_lang, text,
                 action, type, user_id, datetime, merged_into)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                c.sentence_id,
                c.sentence_lang,
                c.translation_id,
                c.translation_lang,
                c.text,
                c.action.to_string(),
                c.kind.to_string(),
                c.user_id,
                to_db_timestamp(&c.datetime),
                c.merged_into,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_for_sentence(&self, sentence_id: SentenceId) -> Result<Vec<Contribution>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM contributions WHERE sentence_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![sentence_id], Self::row_to_contribution)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn list_by(&self, kind: ContributionKind, action: ContributionAction) -> Result<Vec<Contribution>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM contributions WHERE type = ?1 AND action = ?2 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(
                params![kind.to_string(), action.to_string()],
                Self::row_to_contribution,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
