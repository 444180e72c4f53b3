//! Audit logging for the bookkeeper
//!
//! Records create, update and delete operations on categories, expenses and
//! budgets with before/after snapshots in an append-only JSONL file.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookkeeper::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! let entry = AuditEntry::create(
//!     EntityType::Category,
//!     category.id().to_string(),
//!     Some(category.name().to_string()),
//!     &category,
//! );
//! logger.log(&entry)?;
//! ```

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
