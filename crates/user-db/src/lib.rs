//! Storage connector for the user service.
//!
//! Opens the service's single SQLite file through an `r2d2` pool as a
//! shared [`Store`] handle, and keeps the on-disk schema in line with the
//! tables the service declares.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: the whole dataset lives in one local file.
//!   WAL mode allows concurrent readers alongside a single writer.
//! - **Serialized writes**: [`Store::write`] holds a process-wide lock for
//!   the duration of each write so concurrent requests never contend on the
//!   SQLite write lock.
//! - **Additive migrations**: [`migrate`] creates missing tables and adds
//!   missing columns. It never drops a table, a column or a row.

mod migrations;
mod pool;
mod store;

pub use migrations::{migrate, ColumnDef, MigrationError, MigrationReport, TableSchema};
pub use pool::{connect, DbRuntimeSettings, PoolError};
pub use store::Store;

pub(crate) use pool::DbPool;

#[cfg(test)]
#[derive(Debug)]
#[allow(dead_code)]
pub(crate) enum TestError {
    Pool(r2d2::Error),
    Sql(rusqlite::Error),
}

#[cfg(test)]
impl From<r2d2::Error> for TestError {
    fn from(e: r2d2::Error) -> Self {
        TestError::Pool(e)
    }
}

#[cfg(test)]
impl From<rusqlite::Error> for TestError {
    fn from(e: rusqlite::Error) -> Self {
        TestError::Sql(e)
    }
}
