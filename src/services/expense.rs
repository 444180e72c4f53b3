//! Expense store
//!
//! Expense CRUD, attribute assignment and the constraint query engine. Every
//! write refreshes the spent budget inside the same transaction.

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{BookkeeperError, BookkeeperResult, Recovered};
use crate::model::Model;
use crate::models::{
    Category, CategoryId, ConstraintKind, ConstraintValue, Expense, ExpenseChange,
    ExpenseConstraint, ExpenseId, Money,
};
use crate::services::CategoryStore;
use crate::storage::codec::{datetime_column, encode_datetime, now};

/// Operations on the expense ledger
pub trait ExpenseStore {
    /// Record an expense against an existing category.
    ///
    /// `expense_date` defaults to now and `comment` to an empty string.
    fn add_expense(
        &self,
        amount: Money,
        category: &Category,
        expense_date: Option<NaiveDateTime>,
        comment: Option<&str>,
    ) -> BookkeeperResult<Expense>;

    /// Delete one expense; the handle is consumed
    fn delete_expense(&self, expense: Expense) -> BookkeeperResult<()>;

    /// Delete a batch of expenses; either all of them go or none does
    fn delete_expenses(&self, expenses: Vec<Expense>) -> BookkeeperResult<usize>;

    /// Assign fields of an existing expense and refresh the handle.
    ///
    /// Any `Id` or `AddedDate` change fails with `ImmutableField` before the
    /// database is touched.
    fn set_attributes(
        &self,
        expense: &mut Expense,
        changes: &[ExpenseChange],
    ) -> BookkeeperResult<()>;

    fn get_expense_by_id(&self, id: ExpenseId) -> BookkeeperResult<Expense>;

    /// Lenient batch lookup, see [`CategoryStore::get_categories_by_ids`]
    fn get_expenses_by_ids(&self, ids: &[ExpenseId]) -> BookkeeperResult<Vec<Expense>>;

    /// Expenses matching every constraint, in storage order.
    ///
    /// A category constraint naming a category that no longer exists fails
    /// with `NoData`. `max_count` of `None` or a negative value returns all matches.
    fn get_expenses_by_constraints(
        &self,
        constraints: &[ExpenseConstraint],
        max_count: Option<i64>,
    ) -> BookkeeperResult<Vec<Expense>>;

    /// Sum of amounts with an expense date in `[start, end]`
    fn get_expense_amount_by_time_period(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> BookkeeperResult<Money>;

    /// Current category of a stored expense
    fn get_expense_category(&self, expense: &Expense) -> BookkeeperResult<Category>;
}

/// SQLite-backed expense store
pub struct ExpenseService<'a> {
    model: &'a Model,
}

const EXPENSE_COLUMNS: &str = "id, amount, category_id, expense_date, added_date, comment";

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense::new(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        datetime_column(row, 3)?,
        datetime_column(row, 4)?,
        row.get::<_, String>(5)?,
    ))
}

fn fetch_expense(conn: &Connection, id: ExpenseId) -> BookkeeperResult<Option<Expense>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM expenses WHERE id = ?1", EXPENSE_COLUMNS),
            params![id],
            expense_from_row,
        )
        .optional()?)
}

fn require_expense(conn: &Connection, id: ExpenseId) -> BookkeeperResult<Expense> {
    fetch_expense(conn, id)?.ok_or_else(|| BookkeeperError::expense_not_found(id.raw()))
}

fn ensure_non_negative(amount: Money) -> BookkeeperResult<()> {
    if amount.is_negative() {
        return Err(BookkeeperError::Constraint(format!(
            "Expense amount cannot be negative: {}",
            amount
        )));
    }
    Ok(())
}

fn sql_value(value: &ConstraintValue) -> Value {
    match value {
        ConstraintValue::Amount(amount) => Value::Integer(amount.cents()),
        ConstraintValue::Date(date) => Value::Text(encode_datetime(date)),
        ConstraintValue::Category(id) => Value::Integer(id.raw()),
        ConstraintValue::Text(text) => Value::Text(text.clone()),
    }
}

/// Build the `WHERE` clause for a set of validated constraints.
///
/// Each constraint becomes an OR of the comparisons its kind allows; a kind
/// with no flags set matches nothing. Constraints are joined with AND.
fn build_filter(constraints: &[ExpenseConstraint]) -> (String, Vec<Value>) {
    const COMPARISONS: [(ConstraintKind, &str); 3] = [
        (ConstraintKind::LESS, "<"),
        (ConstraintKind::EQUAL, "="),
        (ConstraintKind::GREATER, ">"),
    ];

    let mut values = Vec::new();
    let clauses: Vec<String> = constraints
        .iter()
        .map(|constraint| {
            let column = constraint.field.column();
            let terms: Vec<String> = COMPARISONS
                .iter()
                .filter(|(flag, _)| constraint.kind.contains(*flag))
                .map(|(_, op)| {
                    values.push(sql_value(&constraint.value));
                    format!("{} {} ?", column, op)
                })
                .collect();

            if terms.is_empty() {
                "0".to_string()
            } else {
                format!("({})", terms.join(" OR "))
            }
        })
        .collect();

    (clauses.join(" AND "), values)
}

impl<'a> ExpenseService<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// Delete every expense of a category, returning how many went
    pub(crate) fn delete_by_category(&self, category: CategoryId) -> BookkeeperResult<usize> {
        self.model.storage().transaction(|conn| {
            let removed = conn.execute(
                "DELETE FROM expenses WHERE category_id = ?1",
                params![category],
            )?;
            debug!(%category, removed, "deleted category expenses");
            Ok(removed)
        })
    }

    /// Move every expense of `from` to `to`, returning how many moved
    pub(crate) fn reassign_category(
        &self,
        from: CategoryId,
        to: CategoryId,
    ) -> BookkeeperResult<usize> {
        self.model.storage().transaction(|conn| {
            let moved = conn.execute(
                "UPDATE expenses SET category_id = ?1 WHERE category_id = ?2",
                params![to, from],
            )?;
            debug!(%from, %to, moved, "reassigned category expenses");
            Ok(moved)
        })
    }

    fn delete_rows(&self, conn: &Connection, expenses: &[Expense]) -> BookkeeperResult<()> {
        let mut missing = Vec::new();
        for expense in expenses {
            let removed = conn.execute("DELETE FROM expenses WHERE id = ?1", params![expense.id()])?;
            if removed == 0 {
                missing.push(expense.id().raw());
            }
        }
        if !missing.is_empty() {
            return Err(BookkeeperError::NoData {
                entity_type: "expense",
                missing,
                recovered: Recovered::Expenses(Vec::new()),
            });
        }

        self.model.budgets().refresh_spent()?;
        for expense in expenses {
            self.model
                .log_delete(EntityType::Expense, expense.id(), None, expense)?;
        }
        Ok(())
    }
}

impl ExpenseStore for ExpenseService<'_> {
    fn add_expense(
        &self,
        amount: Money,
        category: &Category,
        expense_date: Option<NaiveDateTime>,
        comment: Option<&str>,
    ) -> BookkeeperResult<Expense> {
        ensure_non_negative(amount)?;

        self.model.storage().transaction(|conn| {
            let category = self.model.categories().get_category_by_id(category.id())?;
            let added = now();
            let expense_date = expense_date.unwrap_or(added);

            conn.execute(
                "INSERT INTO expenses (amount, category_id, expense_date, added_date, comment)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    amount,
                    category.id(),
                    encode_datetime(&expense_date),
                    encode_datetime(&added),
                    comment.unwrap_or_default(),
                ],
            )?;
            let expense = require_expense(conn, ExpenseId::from_raw(conn.last_insert_rowid()))?;

            self.model.budgets().refresh_spent()?;
            info!(id = %expense.id(), %amount, category = %category.id(), "added expense");
            self.model
                .log_create(EntityType::Expense, expense.id(), None, &expense)?;
            Ok(expense)
        })
    }

    fn delete_expense(&self, expense: Expense) -> BookkeeperResult<()> {
        self.model.storage().transaction(|conn| {
            self.delete_rows(conn, std::slice::from_ref(&expense))?;
            info!(id = %expense.id(), "deleted expense");
            Ok(())
        })
    }

    fn delete_expenses(&self, expenses: Vec<Expense>) -> BookkeeperResult<usize> {
        if expenses.is_empty() {
            return Ok(0);
        }
        self.model.storage().transaction(|conn| {
            self.delete_rows(conn, &expenses)?;
            info!(count = expenses.len(), "deleted expenses");
            Ok(expenses.len())
        })
    }

    fn set_attributes(
        &self,
        expense: &mut Expense,
        changes: &[ExpenseChange],
    ) -> BookkeeperResult<()> {
        if let Some(change) = changes.iter().find(|c| c.is_immutable()) {
            return Err(BookkeeperError::ImmutableField(change.field_name()));
        }
        for change in changes {
            if let ExpenseChange::Amount(amount) = change {
                ensure_non_negative(*amount)?;
            }
        }

        let updated = self.model.storage().transaction(|conn| {
            let before = require_expense(conn, expense.id())?;
            let mut after = before.clone();

            for change in changes {
                if let ExpenseChange::Category(id) = change {
                    self.model.categories().get_category_by_id(*id)?;
                }
                after.apply(change);
            }

            conn.execute(
                "UPDATE expenses SET amount = ?1, category_id = ?2, expense_date = ?3, comment = ?4
                 WHERE id = ?5",
                params![
                    after.amount(),
                    after.category_id(),
                    encode_datetime(&after.expense_date()),
                    after.comment(),
                    after.id(),
                ],
            )?;
            let after = require_expense(conn, after.id())?;

            self.model.budgets().refresh_spent()?;
            info!(id = %after.id(), fields = changes.len(), "updated expense");
            self.model
                .log_update(EntityType::Expense, after.id(), None, &before, &after)?;
            Ok(after)
        })?;

        *expense = updated;
        Ok(())
    }

    fn get_expense_by_id(&self, id: ExpenseId) -> BookkeeperResult<Expense> {
        self.model
            .storage()
            .transaction(|conn| require_expense(conn, id))
    }

    fn get_expenses_by_ids(&self, ids: &[ExpenseId]) -> BookkeeperResult<Vec<Expense>> {
        let (found, missing) = self.model.storage().transaction(|conn| {
            let mut found = Vec::with_capacity(ids.len());
            let mut missing = Vec::new();
            for &id in ids {
                match fetch_expense(conn, id)? {
                    Some(expense) => found.push(expense),
                    None => missing.push(id.raw()),
                }
            }
            Ok((found, missing))
        })?;

        if missing.is_empty() {
            return Ok(found);
        }
        Err(BookkeeperError::NoData {
            entity_type: "expense",
            missing,
            recovered: Recovered::Expenses(found),
        })
    }

    fn get_expenses_by_constraints(
        &self,
        constraints: &[ExpenseConstraint],
        max_count: Option<i64>,
    ) -> BookkeeperResult<Vec<Expense>> {
        for constraint in constraints {
            constraint.validate()?;
        }

        let (filter, mut values) = build_filter(constraints);
        let mut sql = format!("SELECT {} FROM expenses", EXPENSE_COLUMNS);
        if !filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filter);
        }
        sql.push_str(" ORDER BY id");
        if let Some(limit) = max_count.filter(|n| *n >= 0) {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit));
        }

        self.model.storage().transaction(|conn| {
            let categories = self.model.categories();
            for constraint in constraints {
                if let ConstraintValue::Category(id) = constraint.value {
                    categories.get_category_by_id(id)?;
                }
            }

            let mut stmt = conn.prepare(&sql)?;
            let expenses = stmt
                .query_map(params_from_iter(values.iter()), expense_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            debug!(constraints = constraints.len(), matched = expenses.len(), "queried expenses");
            Ok(expenses)
        })
    }

    fn get_expense_amount_by_time_period(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> BookkeeperResult<Money> {
        self.model.storage().transaction(|conn| {
            let total: Money = conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM expenses
                 WHERE expense_date >= ?1 AND expense_date <= ?2",
                params![encode_datetime(&start), encode_datetime(&end)],
                |row| row.get(0),
            )?;
            Ok(total)
        })
    }

    fn get_expense_category(&self, expense: &Expense) -> BookkeeperResult<Category> {
        self.model.storage().transaction(|conn| {
            let current = require_expense(conn, expense.id())?;
            self.model
                .categories()
                .get_category_by_id(current.category_id())
        })
    }
}
