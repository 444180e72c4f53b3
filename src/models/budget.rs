//! Budget model
//!
//! A budget holds three spending limits, one per window (day, week, month).
//! One row is reserved for the running "spent" aggregate; it is identified by
//! [`SPENT_PRESET`] and maintained by the budget store, never by users.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::BudgetId;
use super::money::Money;

/// Preset name of the reserved spent aggregate row
pub const SPENT_PRESET: &str = "BUDGET_SPENT_GEN_PRESET";

/// The three fixed budget windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetWindow {
    Daily,
    Weekly,
    Monthly,
}

impl BudgetWindow {
    pub const ALL: [BudgetWindow; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    /// Position of this window in limit and flag triples
    pub const fn index(&self) -> usize {
        match self {
            Self::Daily => 0,
            Self::Weekly => 1,
            Self::Monthly => 2,
        }
    }
}

impl fmt::Display for BudgetWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "Daily"),
            Self::Weekly => write!(f, "Weekly"),
            Self::Monthly => write!(f, "Monthly"),
        }
    }
}

/// A stored budget with its limits and derived exceed flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    id: BudgetId,
    pub preset: String,
    pub daily: Money,
    pub weekly: Money,
    pub monthly: Money,
    exceeded: [bool; 3],
}

impl Budget {
    pub(crate) fn new(
        id: BudgetId,
        preset: impl Into<String>,
        daily: Money,
        weekly: Money,
        monthly: Money,
    ) -> Self {
        Self {
            id,
            preset: preset.into(),
            daily,
            weekly,
            monthly,
            exceeded: [true; 3],
        }
    }

    pub fn id(&self) -> BudgetId {
        self.id
    }

    /// Whether this is the reserved spent aggregate row
    pub fn is_spent(&self) -> bool {
        self.preset == SPENT_PRESET
    }

    /// Limits as a `[daily, weekly, monthly]` triple
    pub fn limits(&self) -> [Money; 3] {
        [self.daily, self.weekly, self.monthly]
    }

    pub fn limit(&self, window: BudgetWindow) -> Money {
        self.limits()[window.index()]
    }

    /// Per-window flags as of the last read, in `[daily, weekly, monthly]` order.
    ///
    /// **`true` means the limit is NOT exceeded** (spent <= limit). A `false`
    /// flag marks a window where spending went over the limit.
    pub fn exceeded(&self) -> [bool; 3] {
        self.exceeded
    }

    /// Whether spending stays within the limit for `window`; see [`Budget::exceeded`]
    pub fn within(&self, window: BudgetWindow) -> bool {
        self.exceeded[window.index()]
    }

    pub(crate) fn set_exceeded(&mut self, flags: [bool; 3]) {
        self.exceeded = flags;
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} / {} / {}",
            self.preset, self.daily, self.weekly, self.monthly
        )
    }
}
