//! Bookkeeper - personal expense tracking with categories and budgets
//!
//! This library provides the core of the bookkeeper application: a tree of
//! spending categories, a ledger of dated expenses that can be queried with
//! typed constraints, and daily/weekly/monthly budgets compared against what
//! was actually spent.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (categories, expenses, budgets, money)
//! - `storage`: SQLite storage layer
//! - `services`: The category, expense and budget stores
//! - `model`: The facade that owns storage and hands out the stores
//! - `audit`: Audit logging system
//! - `display`: Plain-text formatting for terminal output
//! - `cli`: Command handlers for the `bookkeeper` binary
//!
//! # Example
//!
//! ```rust,no_run
//! use bookkeeper::config::{BookkeeperPaths, Settings};
//! use bookkeeper::models::Money;
//! use bookkeeper::services::{CategoryStore, ExpenseStore};
//! use bookkeeper::Model;
//!
//! # fn main() -> bookkeeper::BookkeeperResult<()> {
//! let paths = BookkeeperPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let model = Model::open(&paths, &settings)?;
//!
//! let food = model.categories().add_category("Food", None)?;
//! model.expenses().add_expense(Money::from_cents(1250), &food, None, Some("lunch"))?;
//! # Ok(())
//! # }
//! ```

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod model;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{BookkeeperError, BookkeeperResult};
pub use model::Model;

static INIT: Once = Once::new();

/// Install the global tracing subscriber.
///
/// Filtering follows `RUST_LOG`; without it only warnings from this crate are
/// shown. Safe to call more than once.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bookkeeper=warn"));

        // Another subscriber may already be installed by an embedding program.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_is_idempotent() {
        super::init();
        super::init();
    }
}
