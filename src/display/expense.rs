//! Expense display formatting
//!
//! Register-style tables of expenses and single-expense details.

use std::collections::HashMap;

use crate::config::Settings;
use crate::models::{CategoryId, Expense, Money};

/// Format a single expense as a register row
pub fn format_expense_row(expense: &Expense, category: &str, settings: &Settings) -> String {
    format!(
        "{:<8} {:16} {:20} {:>12}  {}",
        expense.id().to_string(),
        expense.expense_date().format(&settings.date_format).to_string(),
        truncate(category, 20),
        expense.amount().format_with_symbol(&settings.currency_symbol),
        expense.comment()
    )
}

/// Format a list of expenses as a register.
///
/// `category_names` maps category ids to display names; unknown ids are shown
/// as the raw id.
pub fn format_expense_table(
    expenses: &[Expense],
    category_names: &HashMap<CategoryId, String>,
    settings: &Settings,
) -> String {
    if expenses.is_empty() {
        return "No expenses found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<8} {:16} {:20} {:>12}  {}\n",
        "ID", "Date", "Category", "Amount", "Comment"
    ));
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for expense in expenses {
        let fallback = expense.category_id().to_string();
        let category = category_names
            .get(&expense.category_id())
            .map(String::as_str)
            .unwrap_or(&fallback);
        output.push_str(&format_expense_row(expense, category, settings));
        output.push('\n');
    }

    let total: Money = expenses.iter().map(Expense::amount).sum();
    output.push_str(&"-".repeat(70));
    output.push('\n');
    output.push_str(&format!(
        "{} expense{}, total {}\n",
        expenses.len(),
        if expenses.len() == 1 { "" } else { "s" },
        total.format_with_symbol(&settings.currency_symbol)
    ));

    output
}

/// Format expense details for display
pub fn format_expense_details(expense: &Expense, category: &str, settings: &Settings) -> String {
    let mut output = String::new();

    output.push_str(&format!("Expense: {}\n", expense.id()));
    output.push_str(&format!(
        "Amount:   {}\n",
        expense.amount().format_with_symbol(&settings.currency_symbol)
    ));
    output.push_str(&format!("Category: {} ({})\n", category, expense.category_id()));
    output.push_str(&format!(
        "Date:     {}\n",
        expense.expense_date().format(&settings.date_format)
    ));
    output.push_str(&format!(
        "Added:    {}\n",
        expense.added_date().format("%Y-%m-%d %H:%M:%S")
    ));
    if !expense.comment().is_empty() {
        output.push_str(&format!("Comment:  {}\n", expense.comment()));
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseId;
    use chrono::NaiveDate;

    fn expense(id: i64, cents: i64, comment: &str) -> Expense {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(18, 45, 0)
            .unwrap();
        Expense::new(
            ExpenseId::from_raw(id),
            Money::from_cents(cents),
            CategoryId::from_raw(1),
            date,
            date,
            comment,
        )
    }

    #[test]
    fn test_table_uses_settings_and_names() {
        let names = HashMap::from([(CategoryId::from_raw(1), "Food".to_string())]);
        let table = format_expense_table(
            &[expense(1, 1250, "lunch"), expense(2, 50, "")],
            &names,
            &Settings::default(),
        );

        assert!(table.contains("2024-03-09 18:45"));
        assert!(table.contains("$12.50"));
        assert!(table.contains("Food"));
        assert!(table.ends_with("2 expenses, total $13.00\n"));
    }

    #[test]
    fn test_unknown_category_shows_id() {
        let table = format_expense_table(&[expense(1, 100, "")], &HashMap::new(), &Settings::default());
        assert!(table.contains("cat-1"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(
            format_expense_table(&[], &HashMap::new(), &Settings::default()),
            "No expenses found.\n"
        );
    }

    #[test]
    fn test_details_skip_empty_comment() {
        let details = format_expense_details(&expense(3, 700, ""), "Food", &Settings::default());
        assert!(details.contains("Category: Food (cat-1)"));
        assert!(!details.contains("Comment"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a rather long category", 10), "a rathe...");
    }
}
