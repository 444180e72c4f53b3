//! Budget CLI commands
//!
//! Implements CLI commands for setting budgets and comparing them against
//! what was spent today, this week and this month.

use clap::Subcommand;

use super::parse_amount;
use crate::config::Settings;
use crate::display::budget::{format_budget_status, format_budget_table};
use crate::error::BookkeeperResult;
use crate::model::Model;
use crate::services::BudgetStore;

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Show spending against every budget
    Show {
        /// Only show this preset
        preset: Option<String>,
    },

    /// Create or update a budget preset
    Set {
        /// Preset name
        preset: String,
        /// Daily limit
        daily: String,
        /// Weekly limit
        weekly: String,
        /// Monthly limit
        monthly: String,
    },

    /// Recompute what was spent from the ledger
    Refresh,
}

/// Handle a budget command
pub fn handle_budget_command(
    model: &Model,
    settings: &Settings,
    cmd: BudgetCommands,
) -> BookkeeperResult<()> {
    let service = model.budgets();

    match cmd {
        BudgetCommands::Show { preset } => {
            let spent = service.get_spent_budget()?;
            let budgets = match preset {
                Some(preset) => match service.get_budget_preset(&preset)? {
                    Some(budget) => vec![budget],
                    None => {
                        println!("No budget named '{}'.", preset);
                        return Ok(());
                    }
                },
                None => service.get_user_budgets()?,
            };

            print!(
                "{}",
                format_budget_table(&spent, &budgets, &settings.currency_symbol)
            );
            if !budgets.is_empty() {
                println!();
                for budget in &budgets {
                    println!("{}", format_budget_status(budget));
                }
            }
        }

        BudgetCommands::Set {
            preset,
            daily,
            weekly,
            monthly,
        } => {
            let daily = parse_amount(&daily)?;
            let weekly = parse_amount(&weekly)?;
            let monthly = parse_amount(&monthly)?;

            let budget = match service.get_budget_preset(&preset)? {
                Some(mut budget) => {
                    budget.daily = daily;
                    budget.weekly = weekly;
                    budget.monthly = monthly;
                    service.update_budget(&mut budget)?;
                    println!("Updated budget '{}'", budget.preset);
                    budget
                }
                None => {
                    let budget = service.add_budget(&preset, daily, weekly, monthly)?;
                    println!("Created budget '{}' ({})", budget.preset, budget.id());
                    budget
                }
            };
            println!("{}", format_budget_status(&budget));
        }

        BudgetCommands::Refresh => {
            let spent = service.update_spent_budget()?;
            println!(
                "Spent today: {}, this week: {}, this month: {}",
                spent.daily.format_with_symbol(&settings.currency_symbol),
                spent.weekly.format_with_symbol(&settings.currency_symbol),
                spent.monthly.format_with_symbol(&settings.currency_symbol)
            );
        }
    }

    Ok(())
}
