//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the stores.

pub mod budget;
pub mod category;
pub mod expense;

pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use expense::{handle_expense_command, ExpenseCommands};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::Settings;
use crate::error::{BookkeeperError, BookkeeperResult};
use crate::model::Model;
use crate::models::{Category, CategoryId, Money};
use crate::services::{CategoryStore, SpendingWindows};

/// Accepted besides the configured date format
const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Resolve a category by id (`cat-3` or `3`) or by name (case-insensitive)
pub fn find_category(model: &Model, identifier: &str) -> BookkeeperResult<Category> {
    let categories = model.categories();
    if let Ok(id) = identifier.parse::<CategoryId>() {
        return categories.get_category_by_id(id);
    }

    let wanted = identifier.trim().to_lowercase();
    let mut matches: Vec<Category> = categories
        .get_all_categories()?
        .into_iter()
        .filter(|c| c.name().to_lowercase() == wanted)
        .collect();

    match matches.len() {
        0 => Err(BookkeeperError::Constraint(format!(
            "No category named '{}'",
            identifier
        ))),
        1 => Ok(matches.remove(0)),
        _ => {
            let ids: Vec<String> = matches.iter().map(|c| c.id().to_string()).collect();
            Err(BookkeeperError::Constraint(format!(
                "Category name '{}' is ambiguous, use one of: {}",
                identifier,
                ids.join(", ")
            )))
        }
    }
}

/// Parse a user-entered date or datetime.
///
/// Tries the configured format first; a bare date means midnight.
pub fn parse_datetime(input: &str, settings: &Settings) -> BookkeeperResult<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, &settings.date_format) {
        return Ok(dt);
    }
    for format in FALLBACK_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| {
            BookkeeperError::Constraint(format!(
                "Invalid date '{}'. Use {} or YYYY-MM-DD",
                input, settings.date_format
            ))
        })
}

/// Parse the inclusive end of a period.
///
/// A bare date covers that whole day, up to its last stored instant.
pub fn parse_period_end(input: &str, settings: &Settings) -> BookkeeperResult<NaiveDateTime> {
    match NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        Ok(day) => Ok(SpendingWindows::containing(day.and_time(NaiveTime::MIN)).end_of_day),
        Err(_) => parse_datetime(input, settings),
    }
}

/// Parse a user-entered amount such as `12.50`
pub fn parse_amount(input: &str) -> BookkeeperResult<Money> {
    Money::parse(input)
        .map_err(|e| BookkeeperError::Constraint(format!("Invalid amount: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_formats() {
        let settings = Settings::default();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(18, 45, 0)
            .unwrap();

        assert_eq!(parse_datetime("2024-03-09 18:45", &settings).unwrap(), expected);
        assert_eq!(parse_datetime("2024-03-09T18:45:00", &settings).unwrap(), expected);
        assert_eq!(
            parse_datetime("2024-03-09", &settings).unwrap(),
            expected.date().and_time(NaiveTime::MIN)
        );
        assert!(parse_datetime("09/03/2024", &settings).unwrap_err().is_constraint());
    }

    #[test]
    fn test_period_end_covers_whole_day() {
        let settings = Settings::default();
        let end = parse_period_end("2024-03-31", &settings).unwrap();
        let last_expense = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();

        assert!(end > last_expense);
        assert_eq!(end.date(), last_expense.date());
        assert_eq!(
            parse_period_end("2024-03-31 12:00", &settings).unwrap(),
            last_expense.date().and_hms_opt(12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_datetime_uses_configured_format() {
        let settings = Settings {
            date_format: "%d.%m.%Y %H:%M".into(),
            ..Settings::default()
        };
        let parsed = parse_datetime("09.03.2024 07:15", &settings).unwrap();
        assert_eq!(parsed.to_string(), "2024-03-09 07:15:00");
    }

    #[test]
    fn test_find_category_by_id_or_name() {
        let model = Model::in_memory().unwrap();
        let food = model.categories().add_category("Food", None).unwrap();

        assert_eq!(find_category(&model, &food.id().to_string()).unwrap(), food);
        assert_eq!(find_category(&model, "food").unwrap(), food);
        assert!(find_category(&model, "Rent").unwrap_err().is_constraint());
        assert!(find_category(&model, "cat-99").unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_category_ambiguous_name() {
        let model = Model::in_memory().unwrap();
        let a = model.categories().add_category("Home", None).unwrap();
        model.categories().add_category("Misc", Some(&a)).unwrap();
        let b = model.categories().add_category("Work", None).unwrap();
        model.categories().add_category("Misc", Some(&b)).unwrap();

        let err = find_category(&model, "Misc").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.5").unwrap(), Money::from_cents(1250));
        assert!(parse_amount("twelve").unwrap_err().is_constraint());
    }
}
