//! Category CLI commands
//!
//! Implements CLI commands for managing the category tree.

use clap::Subcommand;

use super::find_category;
use crate::display::category::{format_category_list, format_category_tree, format_delete_report};
use crate::error::BookkeeperResult;
use crate::model::Model;
use crate::models::{CategoryUpdate, ChildPolicy, ExpensePolicy};
use crate::services::CategoryStore;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Show the category tree
    List {
        /// Show a flat table instead of a tree
        #[arg(long)]
        flat: bool,
        /// Only show the subtree under this category (name or ID)
        #[arg(short, long)]
        under: Option<String>,
    },

    /// Create a new category
    Add {
        /// Category name
        name: String,
        /// Parent category name or ID (creates a root category if omitted)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Rename a category
    Rename {
        /// Category name or ID
        category: String,
        /// New name
        name: String,
    },

    /// Move a category under another parent
    Move {
        /// Category name or ID
        category: String,
        /// New parent name or ID
        #[arg(short, long, required_unless_present = "root", conflicts_with = "root")]
        to: Option<String>,
        /// Make the category a root
        #[arg(long)]
        root: bool,
    },

    /// Delete a category
    Delete {
        /// Category name or ID
        category: String,
        /// What to do with subcategories: delete or move (to the parent)
        #[arg(long, default_value = "delete")]
        children: ChildPolicy,
        /// What to do with expenses: delete or move (to the parent)
        #[arg(long, default_value = "delete")]
        expenses: ExpensePolicy,
    },

    /// List the direct subcategories of a category
    Children {
        /// Category name or ID
        category: String,
    },
}

/// Handle a category command
pub fn handle_category_command(model: &Model, cmd: CategoryCommands) -> BookkeeperResult<()> {
    let service = model.categories();

    match cmd {
        CategoryCommands::List { flat, under } => {
            let root = under.map(|c| find_category(model, &c)).transpose()?;
            let categories = service.get_whole_subtree(root.as_ref())?;
            if flat {
                print!("{}", format_category_list(&categories));
            } else {
                print!("{}", format_category_tree(&categories));
            }
        }

        CategoryCommands::Add { name, parent } => {
            let parent = parent.map(|p| find_category(model, &p)).transpose()?;
            let category = service.add_category(&name, parent.as_ref())?;

            println!("Created category: {}", category.name());
            if let Some(parent) = &parent {
                println!("  Parent: {}", parent.name());
            }
            println!("  ID: {}", category.id());
        }

        CategoryCommands::Rename { category, name } => {
            let mut cat = find_category(model, &category)?;
            let old_name = cat.name().to_string();
            service.rename_category(&mut cat, &name)?;
            println!("Renamed '{}' to '{}'", old_name, cat.name());
        }

        CategoryCommands::Move { category, to, root } => {
            let mut cat = find_category(model, &category)?;
            let target = if root {
                None
            } else {
                to.map(|t| find_category(model, &t)).transpose()?
            };

            service.update_category(&mut cat, CategoryUpdate::new().parent(target.as_ref().map(|t| t.id())))?;
            match target {
                Some(parent) => println!("Moved '{}' under '{}'", cat.name(), parent.name()),
                None => println!("Moved '{}' to the top level", cat.name()),
            }
        }

        CategoryCommands::Delete {
            category,
            children,
            expenses,
        } => {
            let cat = find_category(model, &category)?;
            let name = cat.name().to_string();
            let report = service.delete_category(cat, children, expenses)?;
            println!("{}", format_delete_report(&name, &report));
        }

        CategoryCommands::Children { category } => {
            let cat = find_category(model, &category)?;
            let children = service.get_children(&cat)?;
            if children.is_empty() {
                println!("'{}' has no subcategories.", cat.name());
            } else {
                print!("{}", format_category_list(&children));
            }
        }
    }

    Ok(())
}
