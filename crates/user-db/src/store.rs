//! The shared storage handle.

use crate::DbPool;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

/// Storage handle shared by every request handler.
///
/// Reads check out a pooled connection and run concurrently. Writes run
/// under a single process-wide lock so at most one writer touches the file
/// at a time.
///
/// Both methods block; call them from `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub(crate) fn new(pool: DbPool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Runs `f` against a pooled connection.
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<r2d2::Error>,
    {
        let conn = self.pool.get()?;
        f(&conn)
    }

    /// Runs `f` against a pooled connection while holding the write lock.
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<r2d2::Error>,
    {
        // The lock guards no data, so a panic in a previous writer leaves
        // nothing inconsistent behind.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let conn = self.pool.get()?;
        f(&conn)
    }
}
