pub mod appointments;
pub mod notifications;
pub mod subscriptions;

#[cfg(test)]
pub(crate) mod fixtures;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use thiserror::Error;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
}

/// Handle to the SQLite file. Every operation opens its own connection and
/// drops it when done; nothing holds a connection across scheduler ticks.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let database = Self { path: path.into() };
        let conn = database.connect()?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(database)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> Result<Connection, DatabaseError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(conn)
    }
}

/// Applies pending migrations, each in its own immediate transaction so
/// concurrent openers of the same file serialize on the write lock.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let migrations: [(i64, &str); 1] = [(1, include_str!("../migrations/001_initial.sql"))];

    for (version, sql) in migrations {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        if version <= current_version(&tx) {
            continue;
        }
        tracing::info!(version, "running migration");
        tx.execute_batch(sql)
            .and_then(|()| tx.commit())
            .map_err(|err| DatabaseError::MigrationFailed {
                version,
                reason: err.to_string(),
            })?;
    }

    Ok(())
}

fn current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, i64>(0)
    })
    .unwrap_or(0)
}
