//! Expense CLI commands
//!
//! Implements CLI commands for recording, querying and editing expenses.

use std::collections::HashMap;

use clap::Subcommand;

use super::{find_category, parse_amount, parse_datetime, parse_period_end};
use crate::config::Settings;
use crate::display::expense::{format_expense_details, format_expense_table};
use crate::error::{BookkeeperError, BookkeeperResult};
use crate::model::Model;
use crate::models::{
    CategoryId, ConstraintKind, ConstraintValue, ExpenseChange, ExpenseConstraint, ExpenseField,
    ExpenseId,
};
use crate::services::{CategoryStore, ExpenseStore, SpendingWindows};
use crate::storage::now;

/// Operators recognised in `--where` filters
const OPERATORS: &[&str] = &["<=", ">=", "!=", "<>", "==", "<", ">", "="];

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record a new expense
    Add {
        /// Amount (e.g., "12" or "12.50")
        amount: String,
        /// Category name or ID
        category: String,
        /// Date of the expense (defaults to now)
        #[arg(short, long)]
        date: Option<String>,
        /// Comment
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// List expenses matching filters
    List {
        /// Filter such as "amount>=10", "date<2024-05-01" or "comment=rent";
        /// may be repeated, all filters must match
        #[arg(short = 'w', long = "where")]
        filters: Vec<String>,
        /// Only expenses of this category (name or ID)
        #[arg(short, long)]
        category: Option<String>,
        /// Maximum number of expenses to show (negative for all)
        #[arg(short, long, allow_hyphen_values = true)]
        limit: Option<i64>,
    },

    /// Show one expense
    Show {
        /// Expense ID
        id: String,
    },

    /// Change fields of an expense
    Set {
        /// Expense ID
        id: String,
        /// Assignments such as "amount=12.50", "category=Food",
        /// "date=2024-05-01 12:00" or "comment=lunch"
        #[arg(required = true)]
        changes: Vec<String>,
    },

    /// Delete expenses
    Delete {
        /// Expense IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Total spent in a period (defaults to the current month)
    Total {
        /// Start of the period
        #[arg(long)]
        from: Option<String>,
        /// End of the period; a bare date includes the whole day
        #[arg(long)]
        to: Option<String>,
    },
}

/// Handle an expense command
pub fn handle_expense_command(
    model: &Model,
    settings: &Settings,
    cmd: ExpenseCommands,
) -> BookkeeperResult<()> {
    let service = model.expenses();

    match cmd {
        ExpenseCommands::Add {
            amount,
            category,
            date,
            comment,
        } => {
            let amount = parse_amount(&amount)?;
            let category = find_category(model, &category)?;
            let date = date.map(|d| parse_datetime(&d, settings)).transpose()?;

            let expense = service.add_expense(amount, &category, date, comment.as_deref())?;
            println!(
                "Added expense {}: {} in '{}'",
                expense.id(),
                expense.amount().format_with_symbol(&settings.currency_symbol),
                category.name()
            );
        }

        ExpenseCommands::List {
            filters,
            category,
            limit,
        } => {
            let mut constraints = filters
                .iter()
                .map(|f| parse_constraint(model, settings, f))
                .collect::<BookkeeperResult<Vec<_>>>()?;
            if let Some(category) = category {
                constraints.push(ExpenseConstraint::category(&find_category(model, &category)?));
            }

            let limit = limit.unwrap_or(settings.max_expenses_shown as i64);
            let expenses = service.get_expenses_by_constraints(&constraints, Some(limit))?;
            print!("{}", format_expense_table(&expenses, &category_names(model)?, settings));
        }

        ExpenseCommands::Show { id } => {
            let expense = service.get_expense_by_id(parse_expense_id(&id)?)?;
            let category = service.get_expense_category(&expense)?;
            print!("{}", format_expense_details(&expense, category.name(), settings));
        }

        ExpenseCommands::Set { id, changes } => {
            let mut expense = service.get_expense_by_id(parse_expense_id(&id)?)?;
            let changes = changes
                .iter()
                .map(|c| parse_change(model, settings, c))
                .collect::<BookkeeperResult<Vec<_>>>()?;

            service.set_attributes(&mut expense, &changes)?;
            let category = service.get_expense_category(&expense)?;
            println!("Updated expense {}", expense.id());
            print!("{}", format_expense_details(&expense, category.name(), settings));
        }

        ExpenseCommands::Delete { ids } => {
            let ids = ids
                .iter()
                .map(|id| parse_expense_id(id))
                .collect::<BookkeeperResult<Vec<_>>>()?;
            let expenses = service.get_expenses_by_ids(&ids)?;
            let removed = service.delete_expenses(expenses)?;
            println!(
                "Deleted {} expense{}",
                removed,
                if removed == 1 { "" } else { "s" }
            );
        }

        ExpenseCommands::Total { from, to } => {
            let windows = SpendingWindows::containing(now());
            let start = match from {
                Some(from) => parse_datetime(&from, settings)?,
                None => windows.start_of_month,
            };
            let end = match to {
                Some(to) => parse_period_end(&to, settings)?,
                None => windows.end_of_day,
            };

            let total = service.get_expense_amount_by_time_period(start, end)?;
            println!(
                "Spent {} between {} and {}",
                total.format_with_symbol(&settings.currency_symbol),
                start.format(&settings.date_format),
                end.format(&settings.date_format)
            );
        }
    }

    Ok(())
}

fn category_names(model: &Model) -> BookkeeperResult<HashMap<CategoryId, String>> {
    Ok(model
        .categories()
        .get_all_categories()?
        .into_iter()
        .map(|c| (c.id(), c.name().to_string()))
        .collect())
}

fn parse_expense_id(input: &str) -> BookkeeperResult<ExpenseId> {
    input
        .parse()
        .map_err(|_| BookkeeperError::Constraint(format!("Invalid expense ID '{}'", input)))
}

fn parse_field(name: &str) -> BookkeeperResult<ExpenseField> {
    match name.trim().to_lowercase().as_str() {
        "amount" => Ok(ExpenseField::Amount),
        "category" => Ok(ExpenseField::Category),
        "date" | "expense_date" => Ok(ExpenseField::ExpenseDate),
        "added" | "added_date" => Ok(ExpenseField::AddedDate),
        "comment" => Ok(ExpenseField::Comment),
        other => Err(BookkeeperError::Constraint(format!(
            "Unknown expense field '{}'",
            other
        ))),
    }
}

/// Parse a filter such as `amount>=10` into a constraint
fn parse_constraint(
    model: &Model,
    settings: &Settings,
    input: &str,
) -> BookkeeperResult<ExpenseConstraint> {
    let (field, op, value) = OPERATORS
        .iter()
        .filter_map(|op| input.find(op).map(|pos| (pos, *op)))
        .min_by_key(|(pos, op)| (*pos, std::cmp::Reverse(op.len())))
        .map(|(pos, op)| (&input[..pos], op, &input[pos + op.len()..]))
        .ok_or_else(|| {
            BookkeeperError::Constraint(format!(
                "Filter '{}' needs an operator such as = or >=",
                input
            ))
        })?;

    let field = parse_field(field)?;
    let kind = ConstraintKind::from_operator(op)
        .ok_or_else(|| BookkeeperError::Constraint(format!("Unknown operator '{}'", op)))?;
    let value = match field {
        ExpenseField::Amount => ConstraintValue::Amount(parse_amount(value)?),
        ExpenseField::ExpenseDate | ExpenseField::AddedDate => {
            ConstraintValue::Date(parse_datetime(value, settings)?)
        }
        ExpenseField::Category => ConstraintValue::Category(find_category(model, value)?.id()),
        ExpenseField::Comment => ConstraintValue::Text(value.to_string()),
    };

    let constraint = ExpenseConstraint::new(field, kind, value);
    constraint.validate()?;
    Ok(constraint)
}

/// Parse an assignment such as `amount=12.50` into a change.
///
/// `id=` and `added_date=` are accepted here and rejected by the store.
fn parse_change(model: &Model, settings: &Settings, input: &str) -> BookkeeperResult<ExpenseChange> {
    let (field, value) = input.split_once('=').ok_or_else(|| {
        BookkeeperError::Constraint(format!("Expected field=value, got '{}'", input))
    })?;

    match field.trim().to_lowercase().as_str() {
        "amount" => Ok(ExpenseChange::Amount(parse_amount(value)?)),
        "category" => Ok(ExpenseChange::Category(find_category(model, value)?.id())),
        "date" | "expense_date" => Ok(ExpenseChange::ExpenseDate(parse_datetime(value, settings)?)),
        "comment" => Ok(ExpenseChange::Comment(value.to_string())),
        "id" => Ok(ExpenseChange::Id(parse_expense_id(value)?)),
        "added" | "added_date" => Ok(ExpenseChange::AddedDate(parse_datetime(value, settings)?)),
        other => Err(BookkeeperError::Constraint(format!(
            "Unknown expense field '{}'",
            other
        ))),
    }
}
