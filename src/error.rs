//! Custom error types for the bookkeeper
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

use crate::models::{Budget, Category, Expense};

/// Entities that a lenient batch lookup managed to resolve before failing
#[derive(Debug, Clone, PartialEq)]
pub enum Recovered {
    Categories(Vec<Category>),
    Expenses(Vec<Expense>),
    Budgets(Vec<Budget>),
}

/// The main error type for bookkeeper operations
#[derive(Error, Debug)]
pub enum BookkeeperError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Database errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// One or more requested ids do not exist.
    ///
    /// Batch lookups still hand back every entity they did resolve in
    /// `recovered`, so callers can carry on with the partial result.
    #[error("No {entity_type} found for id(s) {missing:?}")]
    NoData {
        entity_type: &'static str,
        missing: Vec<i64>,
        recovered: Recovered,
    },

    /// Invalid input for a store operation (bad filter, empty name, ...)
    #[error("Constraint error: {0}")]
    Constraint(String),

    /// Attempt to reassign a field that is fixed at creation
    #[error("Field '{0}' can not be reassigned")]
    ImmutableField(&'static str),

    /// Attempt to modify a reserved, system-maintained record
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Re-parenting would make a category its own ancestor
    #[error("Category {category} can not be moved under its descendant {parent}")]
    Cycle { category: String, parent: String },
}

impl BookkeeperError {
    /// Create a "no data" error for a single missing category
    pub fn category_not_found(id: i64) -> Self {
        Self::NoData {
            entity_type: "category",
            missing: vec![id],
            recovered: Recovered::Categories(Vec::new()),
        }
    }

    /// Create a "no data" error for a single missing expense
    pub fn expense_not_found(id: i64) -> Self {
        Self::NoData {
            entity_type: "expense",
            missing: vec![id],
            recovered: Recovered::Expenses(Vec::new()),
        }
    }

    /// Create a "no data" error for a single missing budget
    pub fn budget_not_found(id: i64) -> Self {
        Self::NoData {
            entity_type: "budget",
            missing: vec![id],
            recovered: Recovered::Budgets(Vec::new()),
        }
    }

    /// Check if this is a "no data" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }

    /// Check if this is a constraint error
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    /// Categories resolved before a lenient lookup failed
    pub fn recovered_categories(self) -> Option<Vec<Category>> {
        match self {
            Self::NoData {
                recovered: Recovered::Categories(found),
                ..
            } => Some(found),
            _ => None,
        }
    }

    /// Expenses resolved before a lenient lookup failed
    pub fn recovered_expenses(self) -> Option<Vec<Expense>> {
        match self {
            Self::NoData {
                recovered: Recovered::Expenses(found),
                ..
            } => Some(found),
            _ => None,
        }
    }

    /// Budgets resolved before a lenient lookup failed
    pub fn recovered_budgets(self) -> Option<Vec<Budget>> {
        match self {
            Self::NoData {
                recovered: Recovered::Budgets(found),
                ..
            } => Some(found),
            _ => None,
        }
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for BookkeeperError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BookkeeperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<rusqlite::Error> for BookkeeperError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type alias for bookkeeper operations
pub type BookkeeperResult<T> = Result<T, BookkeeperError>;
