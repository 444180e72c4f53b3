//! Schema setup
//!
//! Creates the ledger tables on first open. Every statement is idempotent so
//! opening an existing database is a no-op.

use rusqlite::{params, Connection};

use crate::error::{BookkeeperError, BookkeeperResult};

/// Current schema version, recorded in the `meta` table
pub const SCHEMA_VERSION: u32 = 1;

/// Create tables and indexes if they do not exist yet.
///
/// Fails with `Config` on a database written by a newer schema version.
pub fn initialize_schema(conn: &Connection) -> BookkeeperResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );
        "#,
    )?;
    if let Some(version) = stored_schema_version(conn)? {
        if version > SCHEMA_VERSION {
            return Err(BookkeeperError::Config(format!(
                "Database schema version {} is newer than supported version {}",
                version, SCHEMA_VERSION
            )));
        }
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL CHECK (name <> ''),
          parent_id INTEGER REFERENCES categories(id)
        );

        CREATE TABLE IF NOT EXISTS expenses (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          amount INTEGER NOT NULL CHECK (amount >= 0),
          category_id INTEGER NOT NULL REFERENCES categories(id),
          expense_date TEXT NOT NULL,
          added_date TEXT NOT NULL,
          comment TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS budgets (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          preset TEXT NOT NULL UNIQUE,
          daily INTEGER NOT NULL,
          weekly INTEGER NOT NULL,
          monthly INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id);
        CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category_id);
        CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(expense_date);
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Schema version stored in the database, if any
pub fn stored_schema_version(conn: &Connection) -> BookkeeperResult<Option<u32>> {
    use rusqlite::OptionalExtension;

    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()))
}
