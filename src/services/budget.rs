//! Budget store
//!
//! User budgets hold daily, weekly and monthly limits. One extra row, the
//! spent budget, holds what was actually spent in each window and is kept in
//! sync with the ledger by the expense store.
//!
//! # Exceed flags
//!
//! [`BudgetStore::check_if_exceed`] and [`Budget::exceeded`] report `true`
//! when spending is **within** the limit (spent <= limit) and `false` when the
//! limit was exceeded.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{BookkeeperError, BookkeeperResult, Recovered};
use crate::model::Model;
use crate::models::{Budget, BudgetId, BudgetWindow, Money, SPENT_PRESET};
use crate::services::period::SpendingWindows;
use crate::services::ExpenseStore;
use crate::storage::codec::now;

/// Operations on budgets and the spent aggregate
pub trait BudgetStore {
    /// Recompute the spent budget from the ledger as of now
    fn update_spent_budget(&self) -> BookkeeperResult<Budget>;

    /// The spent budget as last computed
    fn get_spent_budget(&self) -> BookkeeperResult<Budget>;

    /// Create a user budget; the preset must be unique
    fn add_budget(
        &self,
        preset: &str,
        daily: Money,
        weekly: Money,
        monthly: Money,
    ) -> BookkeeperResult<Budget>;

    /// Persist preset and limits of an existing budget and refresh its flags
    fn update_budget(&self, budget: &mut Budget) -> BookkeeperResult<()>;

    /// Look a budget up by preset; `None` if there is none
    fn get_budget_preset(&self, preset: &str) -> BookkeeperResult<Option<Budget>>;

    fn get_budget_by_id(&self, id: BudgetId) -> BookkeeperResult<Budget>;

    /// Lenient batch lookup, see [`CategoryStore::get_categories_by_ids`]
    ///
    /// [`CategoryStore::get_categories_by_ids`]: crate::services::CategoryStore::get_categories_by_ids
    fn get_budgets_by_ids(&self, ids: &[BudgetId]) -> BookkeeperResult<Vec<Budget>>;

    /// All user budgets, ordered by id
    fn get_user_budgets(&self) -> BookkeeperResult<Vec<Budget>>;

    /// Compare the spent budget against `budget`'s limits.
    ///
    /// Returns `[daily, weekly, monthly]` where **`true` means NOT exceeded**.
    fn check_if_exceed(&self, budget: &Budget) -> BookkeeperResult<[bool; 3]>;
}

/// SQLite-backed budget store
pub struct BudgetService<'a> {
    model: &'a Model,
}

const BUDGET_COLUMNS: &str = "id, preset, daily, weekly, monthly";

fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget::new(
        row.get(0)?,
        row.get::<_, String>(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn fetch_budget(conn: &Connection, id: BudgetId) -> BookkeeperResult<Option<Budget>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM budgets WHERE id = ?1", BUDGET_COLUMNS),
            params![id],
            budget_from_row,
        )
        .optional()?)
}

fn fetch_by_preset(conn: &Connection, preset: &str) -> BookkeeperResult<Option<Budget>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM budgets WHERE preset = ?1", BUDGET_COLUMNS),
            params![preset],
            budget_from_row,
        )
        .optional()?)
}

/// `[spent <= limit]` per window; `true` means within the limit
pub fn exceed_flags(spent: &Budget, limits: &Budget) -> [bool; 3] {
    BudgetWindow::ALL.map(|window| spent.limit(window) <= limits.limit(window))
}

fn validate_limits(preset: &str, limits: [Money; 3]) -> BookkeeperResult<()> {
    if preset.trim().is_empty() {
        return Err(BookkeeperError::Constraint(
            "Budget preset cannot be empty".into(),
        ));
    }
    if preset == SPENT_PRESET {
        return Err(BookkeeperError::AccessDenied(format!(
            "preset '{}' is reserved",
            SPENT_PRESET
        )));
    }
    if limits.iter().any(Money::is_negative) {
        return Err(BookkeeperError::Constraint(
            "Budget limits cannot be negative".into(),
        ));
    }
    Ok(())
}

fn map_duplicate(err: rusqlite::Error, preset: &str) -> BookkeeperError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            BookkeeperError::Duplicate {
                entity_type: "Budget",
                identifier: preset.to_string(),
            }
        }
        other => other.into(),
    }
}

impl<'a> BudgetService<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// The spent row, inserted with current totals on first use
    fn spent_row(&self, conn: &Connection) -> BookkeeperResult<Budget> {
        if let Some(spent) = fetch_by_preset(conn, SPENT_PRESET)? {
            return Ok(spent);
        }
        conn.execute(
            "INSERT INTO budgets (preset, daily, weekly, monthly) VALUES (?1, 0, 0, 0)",
            params![SPENT_PRESET],
        )?;
        debug!("created spent budget");
        self.write_spent(conn, BudgetId::from_raw(conn.last_insert_rowid()))
    }

    fn write_spent(&self, conn: &Connection, id: BudgetId) -> BookkeeperResult<Budget> {
        let windows = SpendingWindows::containing(now());
        let expenses = self.model.expenses();
        let mut totals = [Money::zero(); 3];
        for window in BudgetWindow::ALL {
            let (start, end) = windows.bounds(window);
            totals[window.index()] = expenses.get_expense_amount_by_time_period(start, end)?;
        }

        conn.execute(
            "UPDATE budgets SET daily = ?1, weekly = ?2, monthly = ?3 WHERE id = ?4",
            params![totals[0], totals[1], totals[2], id],
        )?;
        let spent = Budget::new(id, SPENT_PRESET, totals[0], totals[1], totals[2]);
        debug!(daily = %spent.daily, weekly = %spent.weekly, monthly = %spent.monthly, "refreshed spent budget");
        Ok(spent)
    }

    /// Recompute the spent row; joins the caller's transaction if one is open
    pub(crate) fn refresh_spent(&self) -> BookkeeperResult<Budget> {
        self.model.storage().transaction(|conn| {
            let id = self.spent_row(conn)?.id();
            self.write_spent(conn, id)
        })
    }

    /// Attach exceed flags computed against the stored spent row
    fn with_flags(&self, conn: &Connection, mut budget: Budget) -> BookkeeperResult<Budget> {
        let spent = self.spent_row(conn)?;
        budget.set_exceeded(exceed_flags(&spent, &budget));
        Ok(budget)
    }
}

impl BudgetStore for BudgetService<'_> {
    fn update_spent_budget(&self) -> BookkeeperResult<Budget> {
        let spent = self.refresh_spent()?;
        info!(daily = %spent.daily, weekly = %spent.weekly, monthly = %spent.monthly, "updated spent budget");
        Ok(spent)
    }

    fn get_spent_budget(&self) -> BookkeeperResult<Budget> {
        self.model.storage().transaction(|conn| {
            let spent = self.spent_row(conn)?;
            self.with_flags(conn, spent)
        })
    }

    fn add_budget(
        &self,
        preset: &str,
        daily: Money,
        weekly: Money,
        monthly: Money,
    ) -> BookkeeperResult<Budget> {
        validate_limits(preset, [daily, weekly, monthly])?;

        self.model.storage().transaction(|conn| {
            conn.execute(
                "INSERT INTO budgets (preset, daily, weekly, monthly) VALUES (?1, ?2, ?3, ?4)",
                params![preset, daily, weekly, monthly],
            )
            .map_err(|e| map_duplicate(e, preset))?;

            let id = BudgetId::from_raw(conn.last_insert_rowid());
            let budget = self.with_flags(conn, Budget::new(id, preset, daily, weekly, monthly))?;

            info!(id = %budget.id(), preset, "added budget");
            self.model
                .log_create(EntityType::Budget, budget.id(), Some(preset.to_string()), &budget)?;
            Ok(budget)
        })
    }

    fn update_budget(&self, budget: &mut Budget) -> BookkeeperResult<()> {
        let updated = self.model.storage().transaction(|conn| {
            let before = fetch_budget(conn, budget.id())?
                .ok_or_else(|| BookkeeperError::budget_not_found(budget.id().raw()))?;
            if before.is_spent() {
                return Err(BookkeeperError::AccessDenied(
                    "the spent budget is maintained automatically".into(),
                ));
            }
            validate_limits(&budget.preset, budget.limits())?;

            conn.execute(
                "UPDATE budgets SET preset = ?1, daily = ?2, weekly = ?3, monthly = ?4 WHERE id = ?5",
                params![budget.preset, budget.daily, budget.weekly, budget.monthly, budget.id()],
            )
            .map_err(|e| map_duplicate(e, &budget.preset))?;

            let after = self.with_flags(conn, budget.clone())?;
            info!(id = %after.id(), preset = %after.preset, "updated budget");
            self.model.log_update(
                EntityType::Budget,
                after.id(),
                Some(after.preset.clone()),
                &before,
                &after,
            )?;
            Ok(after)
        })?;

        *budget = updated;
        Ok(())
    }

    fn get_budget_preset(&self, preset: &str) -> BookkeeperResult<Option<Budget>> {
        self.model.storage().transaction(|conn| {
            fetch_by_preset(conn, preset)?
                .map(|budget| self.with_flags(conn, budget))
                .transpose()
        })
    }

    fn get_budget_by_id(&self, id: BudgetId) -> BookkeeperResult<Budget> {
        self.model.storage().transaction(|conn| {
            let budget = fetch_budget(conn, id)?
                .ok_or_else(|| BookkeeperError::budget_not_found(id.raw()))?;
            self.with_flags(conn, budget)
        })
    }

    fn get_budgets_by_ids(&self, ids: &[BudgetId]) -> BookkeeperResult<Vec<Budget>> {
        let (found, missing) = self.model.storage().transaction(|conn| {
            let mut found = Vec::with_capacity(ids.len());
            let mut missing = Vec::new();
            for &id in ids {
                match fetch_budget(conn, id)? {
                    Some(budget) => found.push(self.with_flags(conn, budget)?),
                    None => missing.push(id.raw()),
                }
            }
            Ok((found, missing))
        })?;

        if missing.is_empty() {
            return Ok(found);
        }
        Err(BookkeeperError::NoData {
            entity_type: "budget",
            missing,
            recovered: Recovered::Budgets(found),
        })
    }

    fn get_user_budgets(&self) -> BookkeeperResult<Vec<Budget>> {
        self.model.storage().transaction(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM budgets WHERE preset <> ?1 ORDER BY id",
                BUDGET_COLUMNS
            ))?;
            let budgets = stmt
                .query_map(params![SPENT_PRESET], budget_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            budgets
                .into_iter()
                .map(|budget| self.with_flags(conn, budget))
                .collect()
        })
    }

    fn check_if_exceed(&self, budget: &Budget) -> BookkeeperResult<[bool; 3]> {
        self.model.storage().transaction(|conn| {
            let spent = self.spent_row(conn)?;
            Ok(exceed_flags(&spent, budget))
        })
    }
}
