//! Path management for the bookkeeper
//!
//! ## Path Resolution Order
//!
//! 1. `BOOKKEEPER_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/bookkeeper` or `~/.config/bookkeeper`
//! 3. Windows: `%APPDATA%\bookkeeper`

use std::path::{Path, PathBuf};

use crate::error::{BookkeeperError, BookkeeperResult};

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "BOOKKEEPER_DATA_DIR";

/// Manages all paths used by the bookkeeper
#[derive(Debug, Clone)]
pub struct BookkeeperPaths {
    base_dir: PathBuf,
}

impl BookkeeperPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home or application data directory can be determined.
    pub fn new() -> BookkeeperResult<Self> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding the ledger database
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// SQLite database with categories, expenses and budgets
    pub fn database_file(&self) -> PathBuf {
        self.data_dir().join("bookkeeper.sqlite")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> BookkeeperResult<()> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| {
            BookkeeperError::Io(format!("Failed to create base directory: {}", e))
        })?;

        std::fs::create_dir_all(self.data_dir()).map_err(|e| {
            BookkeeperError::Io(format!("Failed to create data directory: {}", e))
        })?;

        Ok(())
    }

    /// Check if a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> BookkeeperResult<PathBuf> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var("HOME").map_err(|_| {
                BookkeeperError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("bookkeeper"))
}

#[cfg(windows)]
fn resolve_default_path() -> BookkeeperResult<PathBuf> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| BookkeeperError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("bookkeeper"))
}
