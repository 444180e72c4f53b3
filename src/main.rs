use anyhow::Result;
use clap::{Parser, Subcommand};

use bookkeeper::cli::{
    handle_budget_command, handle_category_command, handle_expense_command, BudgetCommands,
    CategoryCommands, ExpenseCommands,
};
use bookkeeper::config::{BookkeeperPaths, Settings};
use bookkeeper::Model;

#[derive(Parser)]
#[command(
    name = "bookkeeper",
    version,
    about = "Personal expense tracker with categories and budgets",
    long_about = "Bookkeeper records expenses in a tree of categories, answers \
                  queries over them and compares daily, weekly and monthly \
                  spending against budgets."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Category management commands
    #[command(subcommand, alias = "cat")]
    Category(CategoryCommands),

    /// Expense management commands
    #[command(subcommand, alias = "exp")]
    Expense(ExpenseCommands),

    /// Budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    bookkeeper::init();
    let cli = Cli::parse();

    let paths = BookkeeperPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    if !paths.is_initialized() {
        settings.save(&paths)?;
    }

    match cli.command {
        Some(Commands::Category(cmd)) => {
            let model = Model::open(&paths, &settings)?;
            handle_category_command(&model, cmd)?;
        }
        Some(Commands::Expense(cmd)) => {
            let model = Model::open(&paths, &settings)?;
            handle_expense_command(&model, &settings, cmd)?;
        }
        Some(Commands::Budget(cmd)) => {
            let model = Model::open(&paths, &settings)?;
            handle_budget_command(&model, &settings, cmd)?;
        }
        Some(Commands::Config) => {
            println!("Bookkeeper Configuration");
            println!("========================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Database:       {}", paths.database_file().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Date format:        {}", settings.date_format);
            println!("  Currency symbol:    {}", settings.currency_symbol);
            println!("  Max expenses shown: {}", settings.max_expenses_shown);
            println!("  Audit enabled:      {}", settings.audit_enabled);
        }
        None => {
            println!("Bookkeeper - personal expense tracking");
            println!();
            println!("Run 'bookkeeper --help' for usage information.");
        }
    }

    Ok(())
}
