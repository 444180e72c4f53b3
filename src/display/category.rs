//! Category display formatting
//!
//! Formats the category forest as an indented tree and flat lists as tables.

use std::collections::HashMap;

use crate::models::{Category, CategoryId, DeleteReport};

/// Format categories as a tree.
///
/// `categories` is any set closed under "parent is either absent or present";
/// nodes whose parent is not in the slice are drawn as roots.
pub fn format_category_tree(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.\n\nRun 'bookkeeper category add <name>' to create one."
            .to_string();
    }

    let present: HashMap<CategoryId, &Category> =
        categories.iter().map(|c| (c.id(), c)).collect();
    let mut children: HashMap<Option<CategoryId>, Vec<&Category>> = HashMap::new();
    for category in categories {
        let parent = category
            .parent_id()
            .filter(|parent| present.contains_key(parent));
        children.entry(parent).or_default().push(category);
    }

    let mut output = String::new();
    let roots = children.get(&None).cloned().unwrap_or_default();
    for root in roots {
        output.push_str(&format!("{} ({})\n", root.name(), root.id()));
        push_children(&mut output, &children, root.id(), "");
    }
    output
}

fn push_children(
    output: &mut String,
    children: &HashMap<Option<CategoryId>, Vec<&Category>>,
    parent: CategoryId,
    indent: &str,
) {
    let Some(nodes) = children.get(&Some(parent)) else {
        return;
    };
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i == nodes.len() - 1;
        let prefix = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{}{}{} ({})\n", indent, prefix, node.name(), node.id()));

        let next = format!("{}{}", indent, if is_last { "    " } else { "│   " });
        push_children(output, children, node.id(), &next);
    }
}

/// Format a simple list of categories
pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.".to_string();
    }

    let name_width = categories
        .iter()
        .map(|c| c.name().len())
        .max()
        .unwrap_or(4)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<8}  {:<width$}  {}\n",
        "ID",
        "Category",
        "Parent",
        width = name_width
    ));
    output.push_str(&format!(
        "{:-<8}  {:-<width$}  {:-<8}\n",
        "",
        "",
        "",
        width = name_width
    ));

    for category in categories {
        let parent = category
            .parent_id()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "{:<8}  {:<width$}  {}\n",
            category.id().to_string(),
            category.name(),
            parent,
            width = name_width
        ));
    }

    output
}

/// One-line summary of a cascading delete
pub fn format_delete_report(name: &str, report: &DeleteReport) -> String {
    format!(
        "Deleted category '{}': {} categor{} and {} expense{} affected",
        name,
        report.categories_touched,
        if report.categories_touched == 1 { "y" } else { "ies" },
        report.expenses_touched,
        if report.expenses_touched == 1 { "" } else { "s" },
    )
}
