//! # Verwaltung - records management for people
//!
//! Data-access layer for three person categories backed by SQLite:
//! - Employees
//! - External employees, each tied to a normalized company
//! - Customers, each tied to a normalized industry
//!
//! Verwaltung provides:
//! - A generic record store with key-ordered, circular navigation
//! - Transactional lookup-or-create of category rows, safe against a
//!   concurrent creator
//! - A navigation cursor tracking the currently displayed record

pub mod record;
pub mod category;
pub mod storage;
pub mod cursor;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use record::{Customer, Employee, ExternalEmployee, Person, PersonRecord, Record, RecordKey, RecordKind};
pub use category::{Category, CategoryResolver, CategoryTable, ResolveStrategy};
pub use storage::{ConnectionProvider, RecordStore, SqliteConnector};
pub use cursor::{Cursor, CursorState, Navigation};

/// Result type alias for Verwaltung operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Verwaltung operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Obtaining a connection or executing a statement failed.
    #[error("Data access failed: {0}")]
    DataAccess(#[from] rusqlite::Error),

    /// The lookup-or-create race could not be settled after one re-select.
    #[error("Could not resolve {table} '{name}'")]
    CategoryResolution { table: CategoryTable, name: String },

    #[error("Row has no {0} name")]
    MissingCategory(CategoryTable),

    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
