mod connection;
mod migrations;
mod schema;

use connection::ConnectionPool;
use schema::TABLES;

use std::path::Path;
use std::sync::MutexGuard;

use rusqlite::Connection;

use crate::error::{CoreError, Result};

/// A migrated sentence store.
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        Self::migrated(ConnectionPool::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::migrated(ConnectionPool::open_in_memory()?)
    }

    fn migrated(pool: ConnectionPool) -> Result<Self> {
        migrations::run_migrations(&mut pool.lock())?;
        Ok(Self { pool })
    }

    /// Exclusive handle on the underlying connection. Callers that need a transaction
    /// take `&mut *guard`.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.pool.lock()
    }

    pub fn path(&self) -> Option<&Path> {
        self.pool.path()
    }

    pub fn count_rows(&self, table: &str) -> Result<usize> {
        let table = TABLES
            .iter()
            .find(|t| **t == table)
            .ok_or_else(|| CoreError::ConfigError(format!("unknown table: {table}")))?;
        let conn = self.pool.lock();
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_sentences(&self) -> Result<usize> {
        self.count_rows("sentences")
    }

    /// Row counts for every table, in schema order.
    pub fn table_counts(&self) -> Result<Vec<(&'static str, usize)>> {
        TABLES
            .iter()
            .map(|table| Ok((*table, self.count_rows(table)?)))
            .collect()
    }
}
