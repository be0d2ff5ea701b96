//! Declarative schema synchronization.
//!
//! Each entity declares its table as a [`TableSchema`]. [`migrate`] compares
//! the declaration with what is on disk and applies only additive changes:
//! a missing table is created, a missing column is appended. Existing data
//! is never touched.

use rusqlite::Connection;
use thiserror::Error;

/// A single declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: &'static str,
    /// SQL type and constraints, e.g. `TEXT NOT NULL DEFAULT ''`.
    pub decl: &'static str,
}

/// The declared shape of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name.
    pub name: &'static str,
    /// Columns in declaration order.
    pub columns: &'static [ColumnDef],
}

impl TableSchema {
    fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("\"{}\" {}", c.name, c.decl))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS \"{}\" ({});", self.name, columns)
    }
}

/// What a migration run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Tables that did not exist and were created.
    pub tables_created: Vec<String>,
    /// `(table, column)` pairs appended to existing tables.
    pub columns_added: Vec<(String, String)>,
}

impl MigrationReport {
    /// Returns `true` when the schema was already up to date.
    pub fn is_empty(&self) -> bool {
        self.tables_created.is_empty() && self.columns_added.is_empty()
    }
}

/// Errors that can occur during schema synchronization.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A DDL statement failed.
    #[error("migration of table '{table}' failed: {source}")]
    Execution {
        /// The table being migrated.
        table: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to read the current shape of a table.
    #[error("failed to inspect table '{table}': {source}")]
    Inspect {
        /// The table being inspected.
        table: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to open or commit the migration transaction.
    #[error("migration transaction failed: {0}")]
    Transaction(rusqlite::Error),

    /// Failed to check out a connection to migrate with.
    #[error("failed to get database connection: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Brings every table in `tables` in line with its declaration.
///
/// Runs inside a single transaction: either every change is applied or none
/// is. Tables and columns not mentioned in the declarations are left alone.
///
/// # Errors
///
/// Returns `MigrationError` if a table cannot be inspected or altered, or if
/// the transaction cannot be committed.
pub fn migrate(conn: &Connection, tables: &[TableSchema]) -> Result<MigrationReport, MigrationError> {
    let tx = conn
        .unchecked_transaction()
        .map_err(MigrationError::Transaction)?;

    let mut report = MigrationReport::default();

    for table in tables {
        let existing = existing_columns(&tx, table.name)?;

        if existing.is_empty() {
            tracing::info!(table = table.name, "creating table");
            tx.execute_batch(&table.create_sql())
                .map_err(|e| MigrationError::Execution {
                    table: table.name.to_string(),
                    source: e,
                })?;
            report.tables_created.push(table.name.to_string());
            continue;
        }

        let missing: Vec<&ColumnDef> = table
            .columns
            .iter()
            .filter(|c| !existing.iter().any(|e| e.eq_ignore_ascii_case(c.name)))
            .collect();

        if missing.is_empty() {
            tracing::debug!(table = table.name, "table up to date, skipping");
            continue;
        }

        for column in missing {
            tracing::info!(table = table.name, column = column.name, "adding column");
            tx.execute_batch(&format!(
                "ALTER TABLE \"{}\" ADD COLUMN \"{}\" {};",
                table.name, column.name, column.decl
            ))
            .map_err(|e| MigrationError::Execution {
                table: table.name.to_string(),
                source: e,
            })?;
            report
                .columns_added
                .push((table.name.to_string(), column.name.to_string()));
        }
    }

    tx.commit().map_err(MigrationError::Transaction)?;

    Ok(report)
}

/// Returns the column names of `table`, or an empty list if it does not exist.
fn existing_columns(conn: &Connection, table: &str) -> Result<Vec<String>, MigrationError> {
    let inspect_err = |e| MigrationError::Inspect {
        table: table.to_string(),
        source: e,
    };

    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info(\"{}\")", table))
        .map_err(inspect_err)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(inspect_err)?;

    let mut columns = Vec::new();
    for row in rows {
        columns.push(row.map_err(inspect_err)?);
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    const ITEMS: TableSchema = TableSchema {
        name: "items",
        columns: &[
            ColumnDef {
                name: "id",
                decl: "INTEGER PRIMARY KEY AUTOINCREMENT",
            },
            ColumnDef {
                name: "label",
                decl: "TEXT NOT NULL DEFAULT ''",
            },
            ColumnDef {
                name: "weight",
                decl: "INTEGER",
            },
        ],
    };

    fn columns_of(conn: &Connection, table: &str) -> Vec<String> {
        existing_columns(conn, table).expect("should inspect table")
    }

    #[test]
    fn migrate_creates_missing_table() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");

        let report = migrate(&conn, &[ITEMS]).expect("migration should succeed");
        assert_eq!(report.tables_created, vec!["items".to_string()]);
        assert!(report.columns_added.is_empty());

        assert_eq!(columns_of(&conn, "items"), vec!["id", "label", "weight"]);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");

        let first = migrate(&conn, &[ITEMS]).expect("first run should succeed");
        assert!(!first.is_empty());

        let second = migrate(&conn, &[ITEMS]).expect("second run should succeed");
        assert!(second.is_empty(), "nothing left to change: {second:?}");
    }

    #[test]
    fn migrate_adds_missing_columns_and_keeps_rows() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch(
            "CREATE TABLE items (id INTEGER PRIMARY KEY AUTOINCREMENT, extra TEXT);
             INSERT INTO items (extra) VALUES ('kept');",
        )
        .expect("should create legacy table");

        let report = migrate(&conn, &[ITEMS]).expect("migration should succeed");
        assert!(report.tables_created.is_empty());
        assert_eq!(
            report.columns_added,
            vec![
                ("items".to_string(), "label".to_string()),
                ("items".to_string(), "weight".to_string()),
            ]
        );

        // Undeclared columns survive and the existing row is intact.
        let (extra, label): (String, String) = conn
            .query_row("SELECT extra, label FROM items WHERE id = 1", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .expect("row should survive migration");
        assert_eq!(extra, "kept");
        assert_eq!(label, "");
    }

    #[test]
    fn failed_migration_rolls_back_earlier_tables() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch("CREATE TABLE broken (x INTEGER);")
            .expect("should create table");

        // Adding a PRIMARY KEY column to an existing table is rejected by SQLite.
        let broken = TableSchema {
            name: "broken",
            columns: &[ColumnDef {
                name: "id",
                decl: "INTEGER PRIMARY KEY",
            }],
        };

        let err = migrate(&conn, &[ITEMS, broken]).expect_err("alter should fail");
        match err {
            MigrationError::Execution { table, .. } => assert_eq!(table, "broken"),
            other => panic!("unexpected error type: {other:?}"),
        }

        assert!(
            columns_of(&conn, "items").is_empty(),
            "items table should be rolled back with the failed run"
        );
    }
}
