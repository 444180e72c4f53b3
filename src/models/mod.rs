//! Core data models for the bookkeeper
//!
//! This module contains the data structures of the expense ledger: the
//! category forest, expenses, budgets and the vocabulary used to query and
//! mutate them.

pub mod budget;
pub mod category;
pub mod expense;
pub mod ids;
pub mod money;

pub use budget::{Budget, BudgetWindow, SPENT_PRESET};
pub use category::{Category, CategoryUpdate, ChildPolicy, DeleteReport, ExpensePolicy};
pub use expense::{
    ConstraintKind, ConstraintValue, Expense, ExpenseChange, ExpenseConstraint, ExpenseField,
};
pub use ids::{BudgetId, CategoryId, ExpenseId};
pub use money::Money;
