//! The `Model` facade
//!
//! Owns the storage and the optional audit log, and hands out the three
//! stores. Each store borrows the model, which is how a store reaches its
//! siblings (an expense write refreshing the spent budget, a category delete
//! cascading into expenses).

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::{BookkeeperPaths, Settings};
use crate::error::BookkeeperResult;
use crate::services::{BudgetService, BudgetStore, CategoryService, ExpenseService};
use crate::storage::Storage;

/// Entry point to the ledger
pub struct Model {
    storage: Storage,
    audit: Option<AuditLogger>,
}

impl Model {
    /// Wrap an opened storage without audit logging
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            audit: None,
        }
    }

    /// Append every mutation to `logger`
    pub fn with_audit_log(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    /// A model over a fresh in-memory database
    pub fn in_memory() -> BookkeeperResult<Self> {
        Ok(Self::new(Storage::in_memory()?))
    }

    /// Open the ledger at its configured location.
    ///
    /// The spent budget is recomputed on open so that windows which rolled
    /// over since the last run start from the right totals.
    pub fn open(paths: &BookkeeperPaths, settings: &Settings) -> BookkeeperResult<Self> {
        let mut model = Self::new(Storage::from_paths(paths)?);
        if settings.audit_enabled {
            model = model.with_audit_log(AuditLogger::new(paths.audit_log()));
        }
        model.budgets().update_spent_budget()?;
        Ok(model)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn audit_log(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    pub fn categories(&self) -> CategoryService<'_> {
        CategoryService::new(self)
    }

    pub fn expenses(&self) -> ExpenseService<'_> {
        ExpenseService::new(self)
    }

    pub fn budgets(&self) -> BudgetService<'_> {
        BudgetService::new(self)
    }

    /// Append entries to the audit log, if one is configured.
    ///
    /// Stores call this as the last step of a transaction so a failed write
    /// rolls the operation back.
    pub(crate) fn record<I>(&self, entries: I) -> BookkeeperResult<()>
    where
        I: IntoIterator<Item = AuditEntry>,
    {
        let Some(logger) = &self.audit else {
            return Ok(());
        };
        for entry in entries {
            logger.log(&entry)?;
        }
        Ok(())
    }

    pub(crate) fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl ToString,
        entity_name: Option<String>,
        entity: &T,
    ) -> BookkeeperResult<()> {
        if self.audit.is_none() {
            return Ok(());
        }
        self.record([AuditEntry::create(
            entity_type,
            entity_id.to_string(),
            entity_name,
            entity,
        )])
    }

    pub(crate) fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl ToString,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> BookkeeperResult<()> {
        if self.audit.is_none() {
            return Ok(());
        }
        self.record([AuditEntry::update(
            entity_type,
            entity_id.to_string(),
            entity_name,
            before,
            after,
        )])
    }

    pub(crate) fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl ToString,
        entity_name: Option<String>,
        entity: &T,
    ) -> BookkeeperResult<()> {
        if self.audit.is_none() {
            return Ok(());
        }
        self.record([AuditEntry::delete(
            entity_type,
            entity_id.to_string(),
            entity_name,
            entity,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::models::{ChildPolicy, ExpensePolicy, Money};
    use crate::services::{CategoryStore, ExpenseStore};
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_database_and_spent_row() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BookkeeperPaths::with_base_dir(temp_dir.path());
        let model = Model::open(&paths, &Settings::default()).unwrap();

        assert!(paths.database_file().exists());
        let spent = model.budgets().get_spent_budget().unwrap();
        assert!(spent.is_spent());
        assert_eq!(spent.daily, Money::zero());
    }

    #[test]
    fn test_mutations_are_audited() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BookkeeperPaths::with_base_dir(temp_dir.path());
        let model = Model::open(&paths, &Settings::default()).unwrap();

        let mut food = model.categories().add_category("Food", None).unwrap();
        model.categories().rename_category(&mut food, "Groceries").unwrap();
        model
            .expenses()
            .add_expense(Money::from_units(3), &food, None, None)
            .unwrap();
        model
            .categories()
            .delete_category(food, ChildPolicy::Delete, ExpensePolicy::Delete)
            .unwrap();

        let entries = model.audit_log().unwrap().read_all().unwrap();
        let ops: Vec<_> = entries.iter().map(|e| (e.entity_type, e.operation)).collect();
        assert_eq!(
            ops,
            vec![
                (EntityType::Category, Operation::Create),
                (EntityType::Category, Operation::Update),
                (EntityType::Expense, Operation::Create),
                (EntityType::Category, Operation::Delete),
            ]
        );
        assert_eq!(
            entries[1].diff_summary.as_deref(),
            Some(r#"name: "Food" -> "Groceries""#)
        );
    }

    #[test]
    fn test_audit_disabled_by_settings() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BookkeeperPaths::with_base_dir(temp_dir.path());
        let settings = Settings {
            audit_enabled: false,
            ..Settings::default()
        };
        let model = Model::open(&paths, &settings).unwrap();

        model.categories().add_category("Food", None).unwrap();

        assert!(model.audit_log().is_none());
        assert!(!paths.audit_log().exists());
    }
}
