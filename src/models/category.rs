//! Category model and deletion policies
//!
//! Categories form a forest: every category has at most one parent, and roots
//! have none. A `Category` value is a snapshot of one stored row. The store
//! stays the source of truth, so mutations go through `CategoryStore` and
//! deleting a category consumes its handle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::CategoryId;

/// A snapshot of a stored category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: String,
    parent: Option<CategoryId>,
}

impl Category {
    pub(crate) fn new(id: CategoryId, name: impl Into<String>, parent: Option<CategoryId>) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
        }
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent id at the time this snapshot was taken
    pub fn parent_id(&self) -> Option<CategoryId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn set_parent(&mut self, parent: Option<CategoryId>) {
        self.parent = parent;
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Partial update for a category: any field left as `None` is untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    /// `Some(None)` turns the category into a root
    pub parent: Option<Option<CategoryId>>,
}

impl CategoryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn parent(mut self, parent: Option<CategoryId>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent.is_none()
    }
}

/// What happens to the children of a deleted category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildPolicy {
    /// Delete the whole subtree, depth-first
    #[default]
    Delete,
    /// Re-parent direct children to the deleted category's parent
    Move,
}

/// What happens to the expenses of every deleted category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpensePolicy {
    /// Delete the expenses
    #[default]
    Delete,
    /// Reattach the expenses to the parent of the top deleted category.
    /// Falls back to `Delete` when that category is a root.
    Move,
}

macro_rules! impl_policy_from_str {
    ($name:ident) => {
        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    "delete" => Ok(Self::Delete),
                    "move" => Ok(Self::Move),
                    other => Err(format!("unknown policy '{}', expected delete or move", other)),
                }
            }
        }
    };
}

impl_policy_from_str!(ChildPolicy);
impl_policy_from_str!(ExpensePolicy);

/// Counts returned by a category deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Categories deleted or re-parented, including the deleted category itself
    pub categories_touched: usize,
    /// Expenses deleted or reattached across the whole cascade
    pub expenses_touched: usize,
}

impl std::ops::AddAssign for DeleteReport {
    fn add_assign(&mut self, other: Self) {
        self.categories_touched += other.categories_touched;
        self.expenses_touched += other.expenses_touched;
    }
}

impl From<DeleteReport> for (usize, usize) {
    fn from(report: DeleteReport) -> Self {
        (report.categories_touched, report.expenses_touched)
    }
}
