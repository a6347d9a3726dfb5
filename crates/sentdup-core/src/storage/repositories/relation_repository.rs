use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection};

use crate::error::Result;
use crate::models::{MergePolicy, RelationSpec, SentenceId};

use super::placeholders;

/// Partition key of a uniqueness-constrained relation row (user id, list id, script...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Null,
    Int(i64),
    Text(String),
}

impl From<ValueRef<'_>> for RowKey {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => RowKey::Null,
            ValueRef::Integer(i) => RowKey::Int(i),
            // A whole real must collide with the same integer key.
            ValueRef::Real(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                RowKey::Int(f as i64)
            }
            ValueRef::Real(f) => RowKey::Text(f.to_string()),
            ValueRef::Text(t) | ValueRef::Blob(t) => {
                RowKey::Text(String::from_utf8_lossy(t).into_owned())
            }
        }
    }
}

/// A relation row projected onto the columns its merge policy cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRow {
    pub id: i64,
    pub reference: SentenceId,
    pub key: RowKey,
    pub rating: Option<i64>,
    pub order: Option<String>,
}

pub trait RelationRepository {
    fn rows(&self, spec: &RelationSpec, field: &str, ids: &[SentenceId]) -> Result<Vec<RelationRow>>;
    fn count_referencing(&self, spec: &RelationSpec, field: &str, ids: &[SentenceId]) -> Result<usize>;
    fn reassign_all(&self, spec: &RelationSpec, field: &str, from: SentenceId, to: SentenceId) -> Result<usize>;
    fn reassign_row(&self, spec: &RelationSpec, field: &str, row_id: i64, to: SentenceId) -> Result<()>;
    fn set_rating(&self, spec: &RelationSpec, row_id: i64, rating: i64) -> Result<()>;
    fn delete_row(&self, spec: &RelationSpec, row_id: i64) -> Result<()>;
}

pub struct SqliteRelationRepository<'a> {
    conn: &'a Connection,
}

struct PolicyColumns {
    key: &'static str,
    rating: &'static str,
    order: &'static str,
}

fn policy_columns(policy: MergePolicy) -> PolicyColumns {
    match policy {
        MergePolicy::Reassign => PolicyColumns {
            key: "NULL",
            rating: "NULL",
            order: "NULL",
        },
        MergePolicy::UniqueKey { key } => PolicyColumns {
            key,
            rating: "NULL",
            order: "NULL",
        },
        MergePolicy::RatingElevation { key, rating } => PolicyColumns {
            key,
            rating,
            order: "NULL",
        },
        MergePolicy::KeepEarliest { key, order } => PolicyColumns {
            key,
            rating: "NULL",
            order,
        },
    }
}

impl<'a> SqliteRelationRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

// Table and column names only ever come from a `RelationSpec`, which is static data.
impl<'a> RelationRepository for SqliteRelationRepository<'a> {
    fn rows(&self, spec: &RelationSpec, field: &str, ids: &[SentenceId]) -> Result<Vec<RelationRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cols = policy_columns(spec.policy);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, {field}, {key}, {rating}, {order} FROM {table}
             WHERE {field} IN ({marks}) ORDER BY id",
            key = cols.key,
            rating = cols.rating,
            order = cols.order,
            table = spec.table,
            marks = placeholders(ids.len()),
        ))?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                Ok(RelationRow {
                    id: row.get(0)?,
                    reference: row.get(1)?,
                    key: RowKey::from(row.get_ref(2)?),
                    rating: row.get(3)?,
                    order: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count_referencing(&self, spec: &RelationSpec, field: &str, ids: &[SentenceId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {table} WHERE {field} IN ({marks})",
                table = spec.table,
                marks = placeholders(ids.len()),
            ),
            params_from_iter(ids.iter()),
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn reassign_all(&self, spec: &RelationSpec, field: &str, from: SentenceId, to: SentenceId) -> Result<usize> {
        let changed = self.conn.execute(
            &format!("UPDATE {table} SET {field} = ?1 WHERE {field} = ?2", table = spec.table),
            params![to, from],
        )?;
        Ok(changed)
    }

    fn reassign_row(&self, spec: &RelationSpec, field: &str, row_id: i64, to: SentenceId) -> Result<()> {
        self.conn.execute(
            &format!("UPDATE {table} SET {field} = ?1 WHERE id = ?2", table = spec.table),
            params![to, row_id],
        )?;
        Ok(())
    }

    fn set_rating(&self, spec: &RelationSpec, row_id: i64, rating: i64) -> Result<()> {
        let column = policy_columns(spec.policy).rating;
        if column == "NULL" {
            return Ok(());
        }
        self.conn.execute(
            &format!("UPDATE {table} SET {column} = ?1 WHERE id = ?2", table = spec.table),
            params![rating, row_id],
        )?;
        Ok(())
    }

    fn delete_row(&self, spec: &RelationSpec, row_id: i64) -> Result<()> {
        self.conn.execute(
            &format!("DELETE FROM {table} WHERE id = ?1", table = spec.table),
            params![row_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Relation;
    use crate::storage::database::Database;

    fn seed(conn: &Connection) {
        conn.execute_batch(
            "
            INSERT INTO users_sentences (user_id, sentence_id, correctness, created, modified)
            VALUES (1, 6, 0, '2014-01-01T00:00:00Z', '2014-01-01T00:00:00Z'),
                   (1, 7, 1, '2014-01-01T00:00:00Z', '2014-01-01T00:00:00Z'),
                   (2, 7, -1, '2014-01-01T00:00:00Z', '2014-01-01T00:00:00Z');
            ",
        )
        .unwrap();
    }

    #[test]
    fn test_row_key_from_real() {
        assert_eq!(RowKey::from(ValueRef::Real(3.0)), RowKey::Int(3));
        assert_eq!(RowKey::from(ValueRef::Real(2.5)), RowKey::Text("2.5".into()));
        assert_eq!(RowKey::from(ValueRef::Integer(3)), RowKey::from(ValueRef::Real(3.0)));
    }

    #[test]
    fn test_rows_project_policy_columns() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        seed(&conn);
        let repo = SqliteRelationRepository::new(&conn);
        let spec = Relation::Collection.spec();

        let rows = repo.rows(&spec, "sentence_id", &[7]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, RowKey::Int(1));
        assert_eq!(rows[0].rating, Some(1));
        assert_eq!(rows[1].rating, Some(-1));
        assert_eq!(rows[0].order, None);
    }

    #[test]
    fn test_reassign_all_counts_changed_rows() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        seed(&conn);
        let repo = SqliteRelationRepository::new(&conn);
        let spec = Relation::Collection.spec();

        assert_eq!(repo.count_referencing(&spec, "sentence_id", &[6, 7]).unwrap(), 3);
        assert_eq!(repo.reassign_all(&spec, "sentence_id", 7, 9).unwrap(), 2);
        assert_eq!(repo.count_referencing(&spec, "sentence_id", &[9]).unwrap(), 2);
        assert_eq!(repo.reassign_all(&spec, "sentence_id", 7, 9).unwrap(), 0);
    }

    #[test]
    fn test_reassign_row_into_existing_key_violates_uniqueness() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        seed(&conn);
        let repo = SqliteRelationRepository::new(&conn);
        let spec = Relation::Collection.spec();
        let row = &repo.rows(&spec, "sentence_id", &[7]).unwrap()[0];

        let err = repo.reassign_row(&spec, "sentence_id", row.id, 6).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_set_rating_ignored_for_policies_without_rating() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let repo = SqliteRelationRepository::new(&conn);
        repo.set_rating(&Relation::Tags.spec(), 1, 5).unwrap();
    }
}
