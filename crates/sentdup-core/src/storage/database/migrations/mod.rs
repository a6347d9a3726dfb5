mod v1_initial;
mod v2_merge_tracking;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::schema::SCHEMA_VERSION;
use crate::error::{CoreError, Result};

/// One forward-only schema step. `up` runs inside the transaction that records it.
pub trait Migration {
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up(&self, conn: &Connection) -> Result<()>;
}

/// Every known step, in version order.
const MIGRATIONS: &[&dyn Migration] = &[
    &v1_initial::V1Initial,
    &v2_merge_tracking::V2MergeTracking,
];

fn ensure_ledger(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at  TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

fn current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

/// Brings the schema up to [`SCHEMA_VERSION`] and returns the versions applied by this call.
pub fn run_migrations(conn: &mut Connection) -> Result<Vec<u32>> {
    apply(conn, MIGRATIONS)
}

fn apply(conn: &mut Connection, migrations: &[&dyn Migration]) -> Result<Vec<u32>> {
    ensure_ledger(conn)?;
    let current = current_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(CoreError::SchemaTooNew {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }

    let mut applied = Vec::new();
    for migration in migrations.iter().filter(|m| m.version() > current) {
        // A failing step leaves neither its DDL nor its ledger row behind.
        let tx = conn.transaction()?;
        migration.up(&tx)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version(), migration.description(), Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        applied.push(migration.version());
    }
    Ok(applied)
}
