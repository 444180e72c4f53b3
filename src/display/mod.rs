//! Display formatting for terminal output
//!
//! Provides utilities for formatting categories, expenses and budgets as
//! plain-text trees and tables.

pub mod budget;
pub mod category;
pub mod expense;

pub use budget::{format_budget_status, format_budget_table};
pub use category::{format_category_list, format_category_tree, format_delete_report};
pub use expense::{format_expense_details, format_expense_row, format_expense_table};
