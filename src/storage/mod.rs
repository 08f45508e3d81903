//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - employees(employee_no, first_name, last_name, street, postal_code, place, phone, email)
//! - external_employees(employee_no, ..., company_id)
//! - customers(customer_no, ..., industry_id)
//! - companies(company_id, name)
//! - industries(industry_id, name)

pub mod schema;
pub mod connector;
pub mod store;

pub use connector::{ConnectionProvider, SqliteConnector, DEFAULT_BUSY_TIMEOUT};
pub use store::{DbStats, RecordStore};
