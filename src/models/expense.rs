//! Expense model and the query vocabulary used to filter expenses
//!
//! An `Expense` is a snapshot of one ledger row. `ExpenseConstraint` describes
//! a single filter (field, comparison kind, value); `ExpenseChange` describes a
//! single attribute assignment for `ExpenseStore::set_attributes`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

use super::category::Category;
use super::ids::{CategoryId, ExpenseId};
use super::money::Money;
use crate::error::{BookkeeperError, BookkeeperResult};

/// A snapshot of a stored expense
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Expense {
    id: ExpenseId,
    amount: Money,
    category: CategoryId,
    expense_date: NaiveDateTime,
    added_date: NaiveDateTime,
    comment: String,
}

impl Expense {
    pub(crate) fn new(
        id: ExpenseId,
        amount: Money,
        category: CategoryId,
        expense_date: NaiveDateTime,
        added_date: NaiveDateTime,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id,
            amount,
            category,
            expense_date,
            added_date,
            comment: comment.into(),
        }
    }

    pub fn id(&self) -> ExpenseId {
        self.id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn category_id(&self) -> CategoryId {
        self.category
    }

    pub fn expense_date(&self) -> NaiveDateTime {
        self.expense_date
    }

    /// When the expense was recorded; fixed at creation
    pub fn added_date(&self) -> NaiveDateTime {
        self.added_date
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Apply an already-persisted change to this snapshot
    pub(crate) fn apply(&mut self, change: &ExpenseChange) {
        match change {
            ExpenseChange::Amount(amount) => self.amount = *amount,
            ExpenseChange::Category(category) => self.category = *category,
            ExpenseChange::ExpenseDate(date) => self.expense_date = *date,
            ExpenseChange::Comment(comment) => self.comment = comment.clone(),
            ExpenseChange::Id(_) | ExpenseChange::AddedDate(_) => {}
        }
    }
}

/// Queryable expense fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseField {
    Amount,
    Category,
    ExpenseDate,
    AddedDate,
    Comment,
}

impl ExpenseField {
    /// Column backing this field
    pub(crate) fn column(&self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Category => "category_id",
            Self::ExpenseDate => "expense_date",
            Self::AddedDate => "added_date",
            Self::Comment => "comment",
        }
    }

    /// Reference and text fields only support equality
    pub fn is_equality_only(&self) -> bool {
        matches!(self, Self::Category | Self::Comment)
    }
}

impl fmt::Display for ExpenseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Amount => "amount",
            Self::Category => "category",
            Self::ExpenseDate => "expense_date",
            Self::AddedDate => "added_date",
            Self::Comment => "comment",
        };
        f.write_str(name)
    }
}

/// Comparison kind as a set of `LESS`, `EQUAL` and `GREATER` flags.
///
/// A row matches when its field is less than the value and `LESS` is set, or
/// equal and `EQUAL` is set, or greater and `GREATER` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintKind(u8);

impl ConstraintKind {
    pub const LESS: Self = Self(1);
    pub const EQUAL: Self = Self(2);
    pub const GREATER: Self = Self(4);
    pub const LEQ: Self = Self(1 | 2);
    pub const GEQ: Self = Self(2 | 4);
    pub const NEQ: Self = Self(1 | 4);

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Parse a comparison operator such as `<=` or `!=`
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "<" => Some(Self::LESS),
            "=" | "==" => Some(Self::EQUAL),
            ">" => Some(Self::GREATER),
            "<=" => Some(Self::LEQ),
            ">=" => Some(Self::GEQ),
            "!=" | "<>" => Some(Self::NEQ),
            _ => None,
        }
    }
}

impl BitOr for ConstraintKind {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.0 & 7 {
            0 => "never",
            1 => "<",
            2 => "=",
            3 => "<=",
            4 => ">",
            5 => "!=",
            6 => ">=",
            _ => "any",
        };
        f.write_str(op)
    }
}

/// Value on the right-hand side of a constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintValue {
    Amount(Money),
    Date(NaiveDateTime),
    Category(CategoryId),
    Text(String),
}

impl From<&Category> for ConstraintValue {
    fn from(category: &Category) -> Self {
        Self::Category(category.id())
    }
}

impl From<Money> for ConstraintValue {
    fn from(amount: Money) -> Self {
        Self::Amount(amount)
    }
}

impl From<NaiveDateTime> for ConstraintValue {
    fn from(date: NaiveDateTime) -> Self {
        Self::Date(date)
    }
}

/// A single expense filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseConstraint {
    pub field: ExpenseField,
    pub kind: ConstraintKind,
    pub value: ConstraintValue,
}

impl ExpenseConstraint {
    pub fn new(field: ExpenseField, kind: ConstraintKind, value: impl Into<ConstraintValue>) -> Self {
        Self {
            field,
            kind,
            value: value.into(),
        }
    }

    pub fn amount(kind: ConstraintKind, amount: Money) -> Self {
        Self::new(ExpenseField::Amount, kind, amount)
    }

    pub fn expense_date(kind: ConstraintKind, date: NaiveDateTime) -> Self {
        Self::new(ExpenseField::ExpenseDate, kind, date)
    }

    /// Expenses attached to exactly this category
    pub fn category(category: &Category) -> Self {
        Self::new(ExpenseField::Category, ConstraintKind::EQUAL, category)
    }

    /// Expenses whose comment equals `comment`
    pub fn comment(comment: impl Into<String>) -> Self {
        Self::new(
            ExpenseField::Comment,
            ConstraintKind::EQUAL,
            ConstraintValue::Text(comment.into()),
        )
    }

    /// Reject constraints the query engine can not evaluate
    pub fn validate(&self) -> BookkeeperResult<()> {
        if self.field.is_equality_only() && self.kind != ConstraintKind::EQUAL {
            return Err(BookkeeperError::Constraint(format!(
                "field '{}' only supports equality, got '{}'",
                self.field, self.kind
            )));
        }

        let value_matches = matches!(
            (self.field, &self.value),
            (ExpenseField::Amount, ConstraintValue::Amount(_))
                | (ExpenseField::ExpenseDate, ConstraintValue::Date(_))
                | (ExpenseField::AddedDate, ConstraintValue::Date(_))
                | (ExpenseField::Category, ConstraintValue::Category(_))
                | (ExpenseField::Comment, ConstraintValue::Text(_))
        );
        if !value_matches {
            return Err(BookkeeperError::Constraint(format!(
                "value {:?} can not be compared with field '{}'",
                self.value, self.field
            )));
        }

        Ok(())
    }
}

/// A single attribute assignment for an existing expense.
///
/// `Id` and `AddedDate` are representable so that field maps coming from
/// outer layers can be rejected loudly by the store instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseChange {
    Amount(Money),
    Category(CategoryId),
    ExpenseDate(NaiveDateTime),
    Comment(String),
    Id(ExpenseId),
    AddedDate(NaiveDateTime),
}

impl ExpenseChange {
    /// Name of the field this change targets
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Amount(_) => "amount",
            Self::Category(_) => "category",
            Self::ExpenseDate(_) => "expense_date",
            Self::Comment(_) => "comment",
            Self::Id(_) => "id",
            Self::AddedDate(_) => "added_date",
        }
    }

    /// Fields fixed at creation time
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Id(_) | Self::AddedDate(_))
    }
}
