//! Stores for the bookkeeper
//!
//! Each store exposes its operations through a trait and is implemented over
//! the SQLite storage owned by [`Model`](crate::Model). Stores validate input,
//! keep the spent budget in sync and write audit entries.

pub mod budget;
pub mod category;
pub mod expense;
pub mod period;

pub use budget::{BudgetService, BudgetStore};
pub use category::{CategoryService, CategoryStore};
pub use expense::{ExpenseService, ExpenseStore};
pub use period::SpendingWindows;
