//! Core schema definition types and validation for table migrations.
//!
//! This crate defines the foundational types for describing a table's
//! desired structure:
//!
//! - [`TableSchema`] — a table name plus an ordered column list.
//! - [`ColumnSpec`] — a single column with its type and constraint flags
//!   (primary key, unique, not-null, default value).
//! - [`ColumnType`] — the column's storage class.
//!
//! Validation ([`validate_schema`]) catches structural errors such as
//! duplicate column names, invalid identifiers, and a missing primary key
//! before a schema is used against a live database.
//!
//! # Example
//!
//! ```
//! use table_migrate_core::*;
//!
//! // The subscription table, minus the uniqueness constraint on user_id.
//! let schema = TableSchema::new("user_channels")
//!     .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key())
//!     .with_column(ColumnSpec::new("user_id", ColumnType::Text))
//!     .with_column(ColumnSpec::new("channel_id", ColumnType::Text))
//!     .with_column(ColumnSpec::new("last_race_time", ColumnType::Text))
//!     .with_column(ColumnSpec::new("display_name", ColumnType::Text));
//!
//! assert!(validate_schema(&schema).is_empty());
//! assert_eq!(schema.primary_key().unwrap().name, "id");
//! ```

mod types;
mod validate;

pub use types::{ColumnSpec, ColumnType, ParseColumnError, TableSchema};
pub use validate::{ValidationError, is_valid_identifier, validate_schema};
