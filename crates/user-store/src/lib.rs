//! User entity and its persistence.
//!
//! Declares the `users` table and implements the two storage operations the
//! service exposes: listing every user and creating one. Identifiers are
//! assigned by SQLite on insert and are never taken from client input.

use rusqlite::{params, Connection, Row};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use user_db::{ColumnDef, TableSchema};

/// Declared shape of the `users` table.
pub const USERS_TABLE: TableSchema = TableSchema {
    name: "users",
    columns: &[
        ColumnDef {
            name: "id",
            decl: "INTEGER PRIMARY KEY AUTOINCREMENT",
        },
        ColumnDef {
            name: "name",
            decl: "TEXT NOT NULL DEFAULT ''",
        },
    ],
};

/// Errors that can occur during user storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A query against the `users` table failed.
    #[error("{0}")]
    Database(#[from] rusqlite::Error),
    /// No pooled connection could be checked out.
    #[error("failed to get database connection: {0}")]
    Pool(#[from] r2d2::Error),
}

/// A persisted user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Storage-assigned identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
}

/// Payload accepted when creating a user.
///
/// Carries no identifier: any `id` in the request body is ignored. Only a
/// JSON object binds; arrays and scalars are rejected.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewUser {
    /// Display name, required.
    pub name: String,
}

impl<'de> Deserialize<'de> for NewUser {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(NewUserVisitor)
    }
}

struct NewUserVisitor;

impl<'de> Visitor<'de> for NewUserVisitor {
    type Value = NewUser;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object with a string field `name`")
    }

    fn visit_map<A>(self, mut map: A) -> Result<NewUser, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut name: Option<String> = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == "name" {
                if name.is_some() {
                    return Err(de::Error::duplicate_field("name"));
                }
                name = Some(map.next_value()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        let name = name.ok_or_else(|| de::Error::missing_field("name"))?;
        Ok(NewUser { name })
    }
}

/// Lists every user in storage order.
pub fn list_users(conn: &Connection) -> Result<Vec<User>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, name FROM users ORDER BY id ASC")?;

    let rows = stmt.query_map([], map_row_to_user)?;
    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

/// Inserts a user and returns it with its assigned identifier.
pub fn create_user(conn: &Connection, input: &NewUser) -> Result<User, StoreError> {
    conn.execute("INSERT INTO users (name) VALUES (?1)", params![input.name])?;
    let id = conn.last_insert_rowid();

    tracing::debug!(user_id = id, "user created");

    Ok(User {
        id,
        name: input.name.clone(),
    })
}

fn map_row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        // Rows written by older schemas may carry NULL names.
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
    })
}
