//! Budget display formatting

use crate::models::{Budget, BudgetWindow};

/// Format user budgets side by side with the spent budget.
///
/// A window whose limit was exceeded is marked with `!`.
pub fn format_budget_table(spent: &Budget, budgets: &[Budget], currency_symbol: &str) -> String {
    let preset_width = budgets
        .iter()
        .map(|b| b.preset.len())
        .max()
        .unwrap_or(0)
        .max(6);

    let mut output = String::new();
    output.push_str(&format!("{:<width$}", "Preset", width = preset_width));
    for window in BudgetWindow::ALL {
        output.push_str(&format!("  {:>14}", window.to_string()));
    }
    output.push('\n');
    output.push_str(&"-".repeat(preset_width + 48));
    output.push('\n');

    output.push_str(&format!("{:<width$}", "Spent", width = preset_width));
    for window in BudgetWindow::ALL {
        output.push_str(&format!(
            "  {:>14}",
            spent.limit(window).format_with_symbol(currency_symbol)
        ));
    }
    output.push('\n');

    if budgets.is_empty() {
        output.push_str("\nNo budgets set. Run 'bookkeeper budget set <preset> <daily> <weekly> <monthly>'.\n");
        return output;
    }

    for budget in budgets {
        output.push_str(&format!("{:<width$}", budget.preset, width = preset_width));
        for window in BudgetWindow::ALL {
            let marker = if budget.within(window) { " " } else { "!" };
            output.push_str(&format!(
                "  {:>13}{}",
                budget.limit(window).format_with_symbol(currency_symbol),
                marker
            ));
        }
        output.push('\n');
    }

    output
}

/// Human-readable status of one budget
pub fn format_budget_status(budget: &Budget) -> String {
    let exceeded: Vec<String> = BudgetWindow::ALL
        .iter()
        .filter(|w| !budget.within(**w))
        .map(|w| w.to_string().to_lowercase())
        .collect();

    if exceeded.is_empty() {
        format!("Budget '{}' is within all limits", budget.preset)
    } else {
        format!(
            "Budget '{}' exceeded: {}",
            budget.preset,
            exceeded.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetId, Money, SPENT_PRESET};

    fn budget(preset: &str, limits: [i64; 3], flags: [bool; 3]) -> Budget {
        let mut b = Budget::new(
            BudgetId::from_raw(1),
            preset,
            Money::from_units(limits[0]),
            Money::from_units(limits[1]),
            Money::from_units(limits[2]),
        );
        b.set_exceeded(flags);
        b
    }

    #[test]
    fn test_table_marks_exceeded_windows() {
        let spent = budget(SPENT_PRESET, [50, 50, 50], [true; 3]);
        let standard = budget("Standard", [40, 500, 2000], [false, true, true]);

        let table = format_budget_table(&spent, &[standard], "$");
        let row = table.lines().find(|l| l.starts_with("Standard")).unwrap();
        assert!(row.contains("$40.00!"));
        assert!(row.contains("$500.00 "));
        assert!(table.contains("Spent"));
    }

    #[test]
    fn test_table_without_budgets() {
        let spent = budget(SPENT_PRESET, [0, 0, 0], [true; 3]);
        assert!(format_budget_table(&spent, &[], "$").contains("No budgets set"));
    }

    #[test]
    fn test_status() {
        let ok = budget("Standard", [1, 1, 1], [true; 3]);
        assert_eq!(format_budget_status(&ok), "Budget 'Standard' is within all limits");

        let over = budget("Standard", [1, 1, 1], [false, false, true]);
        assert_eq!(
            format_budget_status(&over),
            "Budget 'Standard' exceeded: daily, weekly"
        );
    }
}
