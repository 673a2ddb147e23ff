//! Structural validation of schema definitions.
//!
//! Catches errors such as empty column lists, duplicate column names, and a
//! missing primary key before a schema is allowed anywhere near a live
//! database.
//!
//! # Examples
//!
//! ```
//! use table_migrate_core::*;
//!
//! let schema = TableSchema::new("user_channels")
//!     .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key())
//!     .with_column(ColumnSpec::new("user_id", ColumnType::Text));
//! assert!(validate_schema(&schema).is_empty());
//!
//! // Invalid: two columns with the same name
//! let bad = TableSchema::new("t")
//!     .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key())
//!     .with_column(ColumnSpec::new("id", ColumnType::Text));
//! assert!(!validate_schema(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::TableSchema;

/// Schema validation errors.
///
/// Each variant describes a specific structural problem found during
/// validation. The `Display` impl provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Table name is empty or whitespace-only.
    #[error("table name cannot be empty")]
    EmptyTableName,
    /// Table name contains characters other than alphanumerics and underscores.
    #[error("invalid table name: {0}")]
    InvalidTableName(String),
    /// Schema declares no columns.
    #[error("schema must declare at least one column")]
    NoColumns,
    /// A column name is empty or contains invalid characters.
    #[error("invalid column name: {0:?}")]
    InvalidColumnName(String),
    /// Two columns share the same name.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    /// No column is marked as the primary key.
    #[error("schema must declare a primary key column")]
    MissingPrimaryKey,
    /// More than one column is marked as the primary key.
    #[error("multiple primary key columns: {0} and {1}")]
    MultiplePrimaryKeys(String, String),
}

/// Returns whether a name is a safe SQL identifier: non-empty, starting with
/// a letter or underscore, containing only alphanumerics and underscores.
///
/// Identifiers are interpolated into generated SQL, so anything else is
/// rejected outright.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates a schema definition.
///
/// Checks the table name, column names, column uniqueness, and that exactly
/// one column is declared as the primary key. Returns all problems found;
/// an empty vector means the schema is well-formed.
pub fn validate_schema(schema: &TableSchema) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if schema.table.trim().is_empty() {
        errors.push(ValidationError::EmptyTableName);
    } else if !is_valid_identifier(&schema.table) {
        errors.push(ValidationError::InvalidTableName(schema.table.clone()));
    }

    if schema.columns.is_empty() {
        errors.push(ValidationError::NoColumns);
        return errors;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut primary_key: Option<&str> = None;
    for column in &schema.columns {
        if !is_valid_identifier(&column.name) {
            errors.push(ValidationError::InvalidColumnName(column.name.clone()));
        }
        if !seen.insert(column.name.as_str()) {
            errors.push(ValidationError::DuplicateColumn(column.name.clone()));
        }
        if column.primary_key {
            match primary_key {
                None => primary_key = Some(column.name.as_str()),
                Some(first) => errors.push(ValidationError::MultiplePrimaryKeys(
                    first.to_string(),
                    column.name.clone(),
                )),
            }
        }
    }

    if primary_key.is_none() {
        errors.push(ValidationError::MissingPrimaryKey);
    }

    errors
}
