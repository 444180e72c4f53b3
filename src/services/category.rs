//! Category store
//!
//! Maintains the category forest: insertion, rename, re-parenting with a
//! cycle check, pre-order traversal and the cascading delete.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{BookkeeperError, BookkeeperResult, Recovered};
use crate::model::Model;
use crate::models::{
    Category, CategoryId, CategoryUpdate, ChildPolicy, DeleteReport, ExpensePolicy,
};

/// Operations on the category forest
pub trait CategoryStore {
    /// Create a category, as a root or under an existing `parent`
    fn add_category(&self, name: &str, parent: Option<&Category>) -> BookkeeperResult<Category>;

    fn get_category_by_id(&self, id: CategoryId) -> BookkeeperResult<Category>;

    /// Resolve several ids at once.
    ///
    /// If any id is missing this fails with `NoData`, and the error still
    /// carries every category that was found (see
    /// [`BookkeeperError::recovered_categories`]).
    fn get_categories_by_ids(&self, ids: &[CategoryId]) -> BookkeeperResult<Vec<Category>>;

    /// Direct children, ordered by id
    fn get_children(&self, category: &Category) -> BookkeeperResult<Vec<Category>>;

    /// Current parent as stored, `None` for a root
    fn get_parent(&self, category: &Category) -> BookkeeperResult<Option<Category>>;

    fn get_root_categories(&self) -> BookkeeperResult<Vec<Category>>;

    /// Pre-order walk of the subtree under `root` (itself included), or of
    /// the whole forest when `root` is `None`
    fn get_whole_subtree(&self, root: Option<&Category>) -> BookkeeperResult<Vec<Category>>;

    fn get_all_categories(&self) -> BookkeeperResult<Vec<Category>> {
        self.get_whole_subtree(None)
    }

    /// Rename in place; the handle is updated and a copy returned
    fn rename_category(&self, category: &mut Category, name: &str) -> BookkeeperResult<Category>;

    /// Apply a partial update of name and/or parent.
    ///
    /// Moving a category under itself or one of its descendants fails with
    /// `Cycle`.
    fn update_category(
        &self,
        category: &mut Category,
        update: CategoryUpdate,
    ) -> BookkeeperResult<Category>;

    /// Delete `category` under the given cascade policies and report how many
    /// categories and expenses were touched. The handle is consumed.
    fn delete_category(
        &self,
        category: Category,
        child_policy: ChildPolicy,
        expense_policy: ExpensePolicy,
    ) -> BookkeeperResult<DeleteReport>;
}

/// SQLite-backed category store
pub struct CategoryService<'a> {
    model: &'a Model,
}

const CATEGORY_COLUMNS: &str = "id, name, parent_id";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category::new(row.get(0)?, row.get::<_, String>(1)?, row.get(2)?))
}

fn fetch_category(conn: &Connection, id: CategoryId) -> BookkeeperResult<Option<Category>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS),
            params![id],
            category_from_row,
        )
        .optional()?)
}

fn require_category(conn: &Connection, id: CategoryId) -> BookkeeperResult<Category> {
    fetch_category(conn, id)?.ok_or_else(|| BookkeeperError::category_not_found(id.raw()))
}

fn fetch_children(conn: &Connection, id: CategoryId) -> BookkeeperResult<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM categories WHERE parent_id = ?1 ORDER BY id",
        CATEGORY_COLUMNS
    ))?;
    let children = stmt
        .query_map(params![id], category_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(children)
}

fn fetch_roots(conn: &Connection) -> BookkeeperResult<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM categories WHERE parent_id IS NULL ORDER BY id",
        CATEGORY_COLUMNS
    ))?;
    let roots = stmt
        .query_map([], category_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(roots)
}

fn collect_subtree(
    conn: &Connection,
    node: Category,
    out: &mut Vec<Category>,
) -> BookkeeperResult<()> {
    let children = fetch_children(conn, node.id())?;
    out.push(node);
    for child in children {
        collect_subtree(conn, child, out)?;
    }
    Ok(())
}

fn validate_name(name: &str) -> BookkeeperResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BookkeeperError::Constraint(
            "Category name cannot be empty".into(),
        ));
    }
    Ok(name)
}

impl<'a> CategoryService<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// Fail with `Cycle` if `new_parent` is `category` or lies below it
    fn ensure_acyclic(
        &self,
        conn: &Connection,
        category: &Category,
        new_parent: &Category,
    ) -> BookkeeperResult<()> {
        let mut cursor = Some(new_parent.id());
        while let Some(id) = cursor {
            if id == category.id() {
                return Err(BookkeeperError::Cycle {
                    category: category.name().to_string(),
                    parent: new_parent.name().to_string(),
                });
            }
            cursor = fetch_category(conn, id)?.and_then(|c| c.parent_id());
        }
        Ok(())
    }

    /// Delete one node of a cascade.
    ///
    /// `expense_target` is the parent of the category the caller asked to
    /// delete; without one, expenses are deleted whatever the policy says.
    fn delete_node(
        &self,
        conn: &Connection,
        node: Category,
        child_policy: ChildPolicy,
        expense_policy: ExpensePolicy,
        expense_target: Option<CategoryId>,
        audit: &mut Vec<AuditEntry>,
    ) -> BookkeeperResult<DeleteReport> {
        let mut report = DeleteReport::default();

        let children = fetch_children(conn, node.id())?;
        match child_policy {
            ChildPolicy::Delete => {
                for child in children {
                    report += self.delete_node(
                        conn,
                        child,
                        child_policy,
                        expense_policy,
                        expense_target,
                        audit,
                    )?;
                }
            }
            ChildPolicy::Move => {
                for child in children {
                    conn.execute(
                        "UPDATE categories SET parent_id = ?1 WHERE id = ?2",
                        params![node.parent_id(), child.id()],
                    )?;
                    let mut moved = child.clone();
                    moved.set_parent(node.parent_id());
                    audit.push(AuditEntry::update(
                        EntityType::Category,
                        child.id().to_string(),
                        Some(child.name().to_string()),
                        &child,
                        &moved,
                    ));
                    report.categories_touched += 1;
                }
            }
        }

        let expenses = self.model.expenses();
        report.expenses_touched += match (expense_policy, expense_target) {
            (ExpensePolicy::Move, Some(target)) => expenses.reassign_category(node.id(), target)?,
            _ => expenses.delete_by_category(node.id())?,
        };

        conn.execute("DELETE FROM categories WHERE id = ?1", params![node.id()])?;
        audit.push(AuditEntry::delete(
            EntityType::Category,
            node.id().to_string(),
            Some(node.name().to_string()),
            &node,
        ));
        report.categories_touched += 1;

        Ok(report)
    }
}

impl CategoryStore for CategoryService<'_> {
    fn add_category(&self, name: &str, parent: Option<&Category>) -> BookkeeperResult<Category> {
        let name = validate_name(name)?;

        self.model.storage().transaction(|conn| {
            let parent_id = match parent {
                Some(p) => {
                    let stored = fetch_category(conn, p.id())?.ok_or_else(|| {
                        BookkeeperError::Constraint(format!("Parent category {} does not exist", p.id()))
                    })?;
                    Some(stored.id())
                }
                None => None,
            };

            conn.execute(
                "INSERT INTO categories (name, parent_id) VALUES (?1, ?2)",
                params![name, parent_id],
            )?;
            let category = Category::new(
                CategoryId::from_raw(conn.last_insert_rowid()),
                name,
                parent_id,
            );

            info!(id = %category.id(), name, "added category");
            self.model.log_create(
                EntityType::Category,
                category.id(),
                Some(name.to_string()),
                &category,
            )?;
            Ok(category)
        })
    }

    fn get_category_by_id(&self, id: CategoryId) -> BookkeeperResult<Category> {
        self.model
            .storage()
            .transaction(|conn| require_category(conn, id))
    }

    fn get_categories_by_ids(&self, ids: &[CategoryId]) -> BookkeeperResult<Vec<Category>> {
        let (found, missing) = self.model.storage().transaction(|conn| {
            let mut found = Vec::with_capacity(ids.len());
            let mut missing = Vec::new();
            for &id in ids {
                match fetch_category(conn, id)? {
                    Some(category) => found.push(category),
                    None => missing.push(id.raw()),
                }
            }
            Ok((found, missing))
        })?;

        if missing.is_empty() {
            return Ok(found);
        }
        debug!(?missing, resolved = found.len(), "category lookup incomplete");
        Err(BookkeeperError::NoData {
            entity_type: "category",
            missing,
            recovered: Recovered::Categories(found),
        })
    }

    fn get_children(&self, category: &Category) -> BookkeeperResult<Vec<Category>> {
        self.model
            .storage()
            .transaction(|conn| fetch_children(conn, category.id()))
    }

    fn get_parent(&self, category: &Category) -> BookkeeperResult<Option<Category>> {
        self.model.storage().transaction(|conn| {
            match require_category(conn, category.id())?.parent_id() {
                Some(parent) => require_category(conn, parent).map(Some),
                None => Ok(None),
            }
        })
    }

    fn get_root_categories(&self) -> BookkeeperResult<Vec<Category>> {
        self.model.storage().transaction(fetch_roots)
    }

    fn get_whole_subtree(&self, root: Option<&Category>) -> BookkeeperResult<Vec<Category>> {
        self.model.storage().transaction(|conn| {
            let starts = match root {
                Some(category) => vec![require_category(conn, category.id())?],
                None => fetch_roots(conn)?,
            };

            let mut out = Vec::new();
            for start in starts {
                collect_subtree(conn, start, &mut out)?;
            }
            debug!(count = out.len(), "walked category subtree");
            Ok(out)
        })
    }

    fn rename_category(&self, category: &mut Category, name: &str) -> BookkeeperResult<Category> {
        self.update_category(category, CategoryUpdate::new().name(name))
    }

    fn update_category(
        &self,
        category: &mut Category,
        update: CategoryUpdate,
    ) -> BookkeeperResult<Category> {
        let new_name = update.name.as_deref().map(validate_name).transpose()?;

        let updated = self.model.storage().transaction(|conn| {
            let before = require_category(conn, category.id())?;
            let mut after = before.clone();

            if let Some(name) = new_name {
                after.set_name(name);
            }
            if let Some(parent) = update.parent {
                if let Some(parent_id) = parent {
                    let new_parent = require_category(conn, parent_id)?;
                    self.ensure_acyclic(conn, &before, &new_parent)?;
                }
                after.set_parent(parent);
            }

            conn.execute(
                "UPDATE categories SET name = ?1, parent_id = ?2 WHERE id = ?3",
                params![after.name(), after.parent_id(), after.id()],
            )?;

            info!(id = %after.id(), name = after.name(), parent = ?after.parent_id(), "updated category");
            self.model.log_update(
                EntityType::Category,
                after.id(),
                Some(after.name().to_string()),
                &before,
                &after,
            )?;
            Ok(after)
        })?;

        *category = updated.clone();
        Ok(updated)
    }

    fn delete_category(
        &self,
        category: Category,
        child_policy: ChildPolicy,
        expense_policy: ExpensePolicy,
    ) -> BookkeeperResult<DeleteReport> {
        self.model.storage().transaction(|conn| {
            let top = require_category(conn, category.id())?;
            let expense_target = top.parent_id();
            let name = top.name().to_string();

            let mut audit = Vec::new();
            let report = self.delete_node(
                conn,
                top,
                child_policy,
                expense_policy,
                expense_target,
                &mut audit,
            )?;

            if report.expenses_touched > 0 {
                self.model.budgets().refresh_spent()?;
            }

            info!(
                id = %category.id(),
                name = %name,
                ?child_policy,
                ?expense_policy,
                categories = report.categories_touched,
                expenses = report.expenses_touched,
                "deleted category"
            );
            self.model.record(audit)?;
            Ok(report)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseConstraint, Money};
    use crate::services::{BudgetStore, ExpenseStore};

    /// `ROOT -> A -> [A1..A5]`, each `Ai` with five children: 31 nodes under `ROOT`
    fn build_tree(model: &Model) -> (Category, Category, Vec<Category>) {
        let categories = model.categories();
        let root = categories.add_category("ROOT", None).unwrap();
        let a = categories.add_category("A", Some(&root)).unwrap();
        let mut leaves = Vec::new();
        for i in 1..=5 {
            let ai = categories
                .add_category(&format!("A{}", i), Some(&a))
                .unwrap();
            for j in 1..=5 {
                leaves.push(
                    categories
                        .add_category(&format!("A{}{}", i, j), Some(&ai))
                        .unwrap(),
                );
            }
        }
        (root, a, leaves)
    }

    fn count_categories(model: &Model) -> usize {
        model.categories().get_all_categories().unwrap().len()
    }

    #[test]
    fn test_add_root_and_child() {
        let model = Model::in_memory().unwrap();
        let categories = model.categories();

        let food = categories.add_category("Food", None).unwrap();
        let fruit = categories.add_category("Fruit", Some(&food)).unwrap();

        assert!(food.is_root());
        assert_eq!(fruit.parent_id(), Some(food.id()));
        assert_eq!(categories.get_category_by_id(fruit.id()).unwrap(), fruit);
    }

    #[test]
    fn test_add_rejects_empty_name() {
        let model = Model::in_memory().unwrap();
        let err = model.categories().add_category("  ", None).unwrap_err();
        assert!(err.is_constraint());
    }

    #[test]
    fn test_add_rejects_missing_parent() {
        let model = Model::in_memory().unwrap();
        let categories = model.categories();
        let ghost = categories.add_category("Ghost", None).unwrap();
        let stale = ghost.clone();
        categories
            .delete_category(ghost, ChildPolicy::Delete, ExpensePolicy::Delete)
            .unwrap();

        let err = categories.add_category("Orphan", Some(&stale)).unwrap_err();
        assert!(err.is_constraint());
        assert_eq!(count_categories(&model), 0);
    }

    #[test]
    fn test_lenient_lookup_returns_resolved_subset() {
        let model = Model::in_memory().unwrap();
        let categories = model.categories();
        let a = categories.add_category("A", None).unwrap();
        let b = categories.add_category("B", None).unwrap();

        let both = categories.get_categories_by_ids(&[a.id(), b.id()]).unwrap();
        assert_eq!(both, vec![a.clone(), b.clone()]);

        let err = categories
            .get_categories_by_ids(&[a.id(), CategoryId::from_raw(999), b.id()])
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.recovered_categories(), Some(vec![a, b]));
    }

    #[test]
    fn test_single_lookup_missing_is_not_found() {
        let model = Model::in_memory().unwrap();
        let err = model
            .categories()
            .get_category_by_id(CategoryId::from_raw(42))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_navigation() {
        let model = Model::in_memory().unwrap();
        let (root, a, _) = build_tree(&model);
        let categories = model.categories();

        let children = categories.get_children(&a).unwrap();
        let names: Vec<_> = children.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["A1", "A2", "A3", "A4", "A5"]);

        assert_eq!(categories.get_parent(&a).unwrap(), Some(root.clone()));
        assert_eq!(categories.get_parent(&root).unwrap(), None);
        assert_eq!(categories.get_root_categories().unwrap(), vec![root]);
    }

    #[test]
    fn test_whole_subtree_is_pre_order() {
        let model = Model::in_memory().unwrap();
        let categories = model.categories();
        let x = categories.add_category("X", None).unwrap();
        let x1 = categories.add_category("X1", Some(&x)).unwrap();
        let y = categories.add_category("Y", None).unwrap();
        categories.add_category("X11", Some(&x1)).unwrap();
        categories.add_category("X2", Some(&x)).unwrap();
        categories.add_category("Y1", Some(&y)).unwrap();

        let all = categories.get_all_categories().unwrap();
        let names: Vec<_> = all.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["X", "X1", "X11", "X2", "Y", "Y1"]);

        let sub = categories.get_whole_subtree(Some(&x1)).unwrap();
        let names: Vec<_> = sub.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["X1", "X11"]);

        assert_eq!(categories.get_all_categories().unwrap(), all);
    }

    #[test]
    fn test_rename_updates_handle() {
        let model = Model::in_memory().unwrap();
        let categories = model.categories();
        let mut food = categories.add_category("Food", None).unwrap();

        let renamed = categories.rename_category(&mut food, "Groceries").unwrap();

        assert_eq!(food.name(), "Groceries");
        assert_eq!(renamed, food);
        assert_eq!(
            categories.get_category_by_id(food.id()).unwrap().name(),
            "Groceries"
        );
    }

    #[test]
    fn test_update_reparents() {
        let model = Model::in_memory().unwrap();
        let categories = model.categories();
        let a = categories.add_category("A", None).unwrap();
        let b = categories.add_category("B", None).unwrap();
        let mut c = categories.add_category("C", Some(&a)).unwrap();

        categories
            .update_category(&mut c, CategoryUpdate::new().parent(Some(b.id())))
            .unwrap();
        assert_eq!(c.parent_id(), Some(b.id()));
        assert_eq!(categories.get_children(&b).unwrap(), vec![c.clone()]);
        assert!(categories.get_children(&a).unwrap().is_empty());

        categories
            .update_category(&mut c, CategoryUpdate::new().name("C!").parent(None))
            .unwrap();
        assert!(c.is_root());
        assert_eq!(c.name(), "C!");
    }

    #[test]
    fn test_update_rejects_cycles() {
        let model = Model::in_memory().unwrap();
        let (_, mut a, leaves) = build_tree(&model);
        let categories = model.categories();

        let err = categories
            .update_category(&mut a, CategoryUpdate::new().parent(Some(leaves[7].id())))
            .unwrap_err();
        assert!(matches!(err, BookkeeperError::Cycle { .. }));

        let a_id = a.id();
        let err = categories
            .update_category(&mut a, CategoryUpdate::new().parent(Some(a_id)))
            .unwrap_err();
        assert!(matches!(err, BookkeeperError::Cycle { .. }));

        assert_eq!(count_categories(&model), 32);
    }

    #[test]
    fn test_delete_subtree_without_expenses() {
        let model = Model::in_memory().unwrap();
        let (root, a, leaves) = build_tree(&model);

        let report = model
            .categories()
            .delete_category(a, ChildPolicy::Delete, ExpensePolicy::Delete)
            .unwrap();

        assert_eq!(<(usize, usize)>::from(report), (31, 0));
        assert_eq!(model.categories().get_all_categories().unwrap(), vec![root]);
        assert!(model
            .categories()
            .get_category_by_id(leaves[0].id())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_delete_subtree_with_expenses() {
        let model = Model::in_memory().unwrap();
        let (_, a, leaves) = build_tree(&model);
        for leaf in &leaves {
            model
                .expenses()
                .add_expense(Money::from_units(1), leaf, None, None)
                .unwrap();
        }

        let report = model
            .categories()
            .delete_category(a, ChildPolicy::Delete, ExpensePolicy::Delete)
            .unwrap();

        assert_eq!(<(usize, usize)>::from(report), (31, 25));
        assert!(model
            .expenses()
            .get_expenses_by_constraints(&[], None)
            .unwrap()
            .is_empty());
        assert_eq!(model.budgets().get_spent_budget().unwrap().daily, Money::zero());
    }

    #[test]
    fn test_delete_moves_children_to_grandparent() {
        let model = Model::in_memory().unwrap();
        let (root, a, _) = build_tree(&model);
        let children = model.categories().get_children(&a).unwrap();

        let report = model
            .categories()
            .delete_category(a, ChildPolicy::Move, ExpensePolicy::Delete)
            .unwrap();

        assert_eq!(<(usize, usize)>::from(report), (6, 0));
        let moved = model.categories().get_children(&root).unwrap();
        let moved_ids: Vec<_> = moved.iter().map(|c| c.id()).collect();
        let expected: Vec<_> = children.iter().map(|c| c.id()).collect();
        assert_eq!(moved_ids, expected);
        assert_eq!(count_categories(&model), 31);
    }

    #[test]
    fn test_delete_root_with_move_makes_children_roots() {
        let model = Model::in_memory().unwrap();
        let (root, a, _) = build_tree(&model);

        let report = model
            .categories()
            .delete_category(root, ChildPolicy::Move, ExpensePolicy::Move)
            .unwrap();

        assert_eq!(<(usize, usize)>::from(report), (2, 0));
        let roots = model.categories().get_root_categories().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id(), a.id());
    }

    #[test]
    fn test_delete_moves_expenses_to_top_parent() {
        let model = Model::in_memory().unwrap();
        let (root, a, leaves) = build_tree(&model);
        let expenses = model.expenses();
        expenses
            .add_expense(Money::from_units(5), &a, None, None)
            .unwrap();
        expenses
            .add_expense(Money::from_units(7), &leaves[24], None, None)
            .unwrap();

        let report = model
            .categories()
            .delete_category(a, ChildPolicy::Delete, ExpensePolicy::Move)
            .unwrap();

        assert_eq!(<(usize, usize)>::from(report), (31, 2));
        let under_root = expenses
            .get_expenses_by_constraints(&[ExpenseConstraint::category(&root)], None)
            .unwrap();
        assert_eq!(under_root.len(), 2);
        assert_eq!(
            model.budgets().get_spent_budget().unwrap().daily,
            Money::from_units(12)
        );
    }

    #[test]
    fn test_expense_move_from_root_falls_back_to_delete() {
        let model = Model::in_memory().unwrap();
        let root = model.categories().add_category("ROOT", None).unwrap();
        let child = model.categories().add_category("Child", Some(&root)).unwrap();
        model
            .expenses()
            .add_expense(Money::from_units(2), &child, None, None)
            .unwrap();

        let report = model
            .categories()
            .delete_category(root, ChildPolicy::Delete, ExpensePolicy::Move)
            .unwrap();

        assert_eq!(<(usize, usize)>::from(report), (2, 1));
        assert!(model
            .expenses()
            .get_expenses_by_constraints(&[], None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_missing_category_fails_without_effect() {
        let model = Model::in_memory().unwrap();
        let (_, a, _) = build_tree(&model);
        let stale = a.clone();
        model
            .categories()
            .delete_category(a, ChildPolicy::Delete, ExpensePolicy::Delete)
            .unwrap();

        let err = model
            .categories()
            .delete_category(stale, ChildPolicy::Delete, ExpensePolicy::Delete)
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(count_categories(&model), 1);
    }
}
