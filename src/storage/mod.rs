//! Storage layer for the bookkeeper
//!
//! Wraps one SQLite connection. Every store operation runs inside
//! [`Storage::transaction`]; an operation that calls into a sibling store
//! joins the transaction that is already open instead of starting a new one,
//! so a whole cascade commits or rolls back as a unit.

pub mod codec;
pub mod file_io;
pub mod init;

pub use codec::{decode_datetime, encode_datetime, now, DATETIME_FORMAT};
pub use file_io::write_json_atomic;
pub use init::initialize_schema;

use std::cell::Cell;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::config::paths::BookkeeperPaths;
use crate::error::{BookkeeperError, BookkeeperResult};

/// Owner of the database connection
pub struct Storage {
    conn: Connection,
    path: Option<PathBuf>,
    depth: Cell<u32>,
}

impl Storage {
    /// Open (and if needed create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> BookkeeperResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BookkeeperError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )?;
        debug!(path = %path.display(), "opened ledger database");
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    /// Open the database at its configured location
    pub fn from_paths(paths: &BookkeeperPaths) -> BookkeeperResult<Self> {
        paths.ensure_directories()?;
        Self::open(paths.database_file())
    }

    /// A private in-memory database, used by tests and dry runs
    pub fn in_memory() -> BookkeeperResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> BookkeeperResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            path,
            depth: Cell::new(0),
        })
    }

    /// Database file, or `None` for an in-memory database
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Check whether a transaction is currently open
    pub fn in_transaction(&self) -> bool {
        self.depth.get() > 0
    }

    /// Run `f` inside a transaction.
    ///
    /// The outermost call begins the transaction, commits it when `f` returns
    /// `Ok` and rolls it back when `f` returns `Err` or panics. Nested calls
    /// run on the already open transaction and leave commit or rollback to
    /// the outermost call.
    pub fn transaction<T, F>(&self, f: F) -> BookkeeperResult<T>
    where
        F: FnOnce(&Connection) -> BookkeeperResult<T>,
    {
        if self.in_transaction() {
            let _scope = DepthGuard::enter(&self.depth);
            return f(&self.conn);
        }

        let tx = self.conn.unchecked_transaction()?;
        let result = {
            let _scope = DepthGuard::enter(&self.depth);
            f(&tx)
        };

        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                debug!(error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}

/// Tracks transaction nesting; decrements on drop so panics unwind cleanly
struct DepthGuard<'a> {
    depth: &'a Cell<u32>,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<u32>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}
