//! Opening the database file.

use crate::Store;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;
use thiserror::Error;

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

pub(crate) type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur when opening the database.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The database file could not be opened or configured.
    #[error("failed to connect db: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Opens the database at `db_path` and returns the shared storage handle.
///
/// The file is created if it does not exist. Connections are opened
/// eagerly, so an unusable path is reported here and never on a request.
/// Pass `:memory:` for a throwaway database.
///
/// # Errors
///
/// Returns `PoolError::PoolInit` if no connection can be opened.
pub fn connect(db_path: &str, settings: DbRuntimeSettings) -> Result<Store, PoolError> {
    let busy_timeout = Duration::from_millis(settings.busy_timeout_ms);

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_init(move |conn| prepare_connection(conn, busy_timeout));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        max_size = settings.pool_max_size,
        "database opened"
    );

    Ok(Store::new(pool))
}

/// Puts a fresh connection into WAL mode and sets its busy timeout.
fn prepare_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    // In-memory databases stay in "memory" mode.
    if !mode.eq_ignore_ascii_case("wal") && !mode.eq_ignore_ascii_case("memory") {
        tracing::warn!(journal_mode = %mode, "database refused WAL journal mode");
    }

    conn.busy_timeout(busy_timeout)
}
