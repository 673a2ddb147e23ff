//! Schema definition types for table migrations.
//!
//! This module defines the data model used to describe a table's desired
//! structure. The types are designed for serialization with [`serde`] and
//! can be supplied either as JSON documents or built programmatically with
//! the constructor methods.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage class of a column.
///
/// Maps to SQLite type affinities. [`ColumnType::Any`] produces a column
/// with no declared type.
///
/// # Examples
///
/// ```
/// use table_migrate_core::ColumnType;
///
/// let ty = ColumnType::default();
/// assert_eq!(ty, ColumnType::Any);
/// assert_eq!(ColumnType::Text.sql_name(), Some("TEXT"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColumnType {
    /// Integer affinity.
    Integer,
    /// Text affinity.
    Text,
    /// Real (floating point) affinity.
    Real,
    /// Blob storage.
    Blob,
    /// No declared type (the default).
    #[default]
    Any,
}

impl ColumnType {
    /// The SQL type name emitted in `CREATE TABLE` statements, or `None`
    /// for columns with no declared type.
    pub fn sql_name(&self) -> Option<&'static str> {
        match self {
            ColumnType::Integer => Some("INTEGER"),
            ColumnType::Text => Some("TEXT"),
            ColumnType::Real => Some("REAL"),
            ColumnType::Blob => Some("BLOB"),
            ColumnType::Any => None,
        }
    }
}

/// Errors produced when parsing the compact `name:type[:flag,...]` column
/// specification format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColumnError {
    /// The specification has no column name.
    #[error("column specification is missing a name")]
    MissingName,
    /// The type segment is not one of `integer|text|real|blob|any`.
    #[error("unknown column type: {0}")]
    UnknownType(String),
    /// A flag segment is not one of `pk|unique|notnull`.
    #[error("unknown column flag: {0}")]
    UnknownFlag(String),
}

/// Definition of a single column: name, storage class, and constraint flags.
///
/// Use [`ColumnSpec::new`] and chain the builder methods to set constraints,
/// or [`ColumnSpec::parse`] for the compact text form used on the command
/// line.
///
/// # Examples
///
/// ```
/// use table_migrate_core::{ColumnSpec, ColumnType};
///
/// let id = ColumnSpec::new("id", ColumnType::Integer).primary_key();
/// assert!(id.primary_key);
///
/// let user = ColumnSpec::parse("user_id:text:unique").unwrap();
/// assert_eq!(user.column_type, ColumnType::Text);
/// assert!(user.unique);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// Storage class.
    #[serde(default)]
    pub column_type: ColumnType,
    /// Whether this column is the table's primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether values must be unique across rows.
    #[serde(default)]
    pub unique: bool,
    /// Whether NULL values are rejected.
    #[serde(default)]
    pub not_null: bool,
    /// Literal default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ColumnSpec {
    /// Creates a column with the given name and type and no constraints.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            unique: false,
            not_null: false,
            default_value: None,
        }
    }

    /// Marks this column as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Adds a uniqueness constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Adds a NOT NULL constraint.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets a literal default value.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Parses the compact `name:type[:flag,...]` form.
    ///
    /// The type is one of `integer|text|real|blob|any` (defaulting to `any`
    /// when omitted); flags are a comma-separated list of `pk`, `unique`,
    /// and `notnull`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseColumnError`] if the name is empty or a type/flag
    /// segment is not recognized.
    pub fn parse(spec: &str) -> Result<Self, ParseColumnError> {
        let mut segments = spec.splitn(3, ':');

        let name = segments.next().unwrap_or("").trim();
        if name.is_empty() {
            return Err(ParseColumnError::MissingName);
        }

        let column_type = match segments.next().map(str::trim) {
            None | Some("") => ColumnType::Any,
            Some("integer") => ColumnType::Integer,
            Some("text") => ColumnType::Text,
            Some("real") => ColumnType::Real,
            Some("blob") => ColumnType::Blob,
            Some("any") => ColumnType::Any,
            Some(other) => return Err(ParseColumnError::UnknownType(other.to_string())),
        };

        let mut column = ColumnSpec::new(name, column_type);
        if let Some(flags) = segments.next() {
            for flag in flags.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                match flag {
                    "pk" => column.primary_key = true,
                    "unique" => column.unique = true,
                    "notnull" => column.not_null = true,
                    other => return Err(ParseColumnError::UnknownFlag(other.to_string())),
                }
            }
        }

        Ok(column)
    }
}

/// Desired structure of a table: its name and an ordered column list.
///
/// # Examples
///
/// ```
/// use table_migrate_core::{ColumnSpec, ColumnType, TableSchema};
///
/// let schema = TableSchema::new("user_channels")
///     .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key())
///     .with_column(ColumnSpec::new("user_id", ColumnType::Text).unique());
///
/// assert_eq!(schema.primary_key().unwrap().name, "id");
/// assert!(schema.find_column("user_id").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub table: String,
    /// Ordered column definitions.
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Creates an empty schema for the given table name.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column definition.
    pub fn with_column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Looks up a column by name.
    pub fn find_column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The primary key column, if one is declared.
    pub fn primary_key(&self) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.primary_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only_defaults_to_any() {
        let col = ColumnSpec::parse("notes").unwrap();
        assert_eq!(col.name, "notes");
        assert_eq!(col.column_type, ColumnType::Any);
        assert!(!col.primary_key && !col.unique && !col.not_null);
    }

    #[test]
    fn test_parse_type_and_flags() {
        let col = ColumnSpec::parse("id:integer:pk,notnull").unwrap();
        assert_eq!(col.column_type, ColumnType::Integer);
        assert!(col.primary_key);
        assert!(col.not_null);
        assert!(!col.unique);
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert_eq!(
            ColumnSpec::parse("age:varchar"),
            Err(ParseColumnError::UnknownType("varchar".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        assert_eq!(
            ColumnSpec::parse("age:integer:indexed"),
            Err(ParseColumnError::UnknownFlag("indexed".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        assert_eq!(ColumnSpec::parse(""), Err(ParseColumnError::MissingName));
        assert_eq!(
            ColumnSpec::parse(":text"),
            Err(ParseColumnError::MissingName)
        );
    }

    #[test]
    fn test_schema_round_trips_through_json() {
        let schema = TableSchema::new("user_channels")
            .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnSpec::new("user_id", ColumnType::Text).unique())
            .with_column(ColumnSpec::new("display_name", ColumnType::Text));

        let json = serde_json::to_string(&schema).unwrap();
        let loaded: TableSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, loaded);
    }

    #[test]
    fn test_schema_json_defaults_missing_flags() {
        let json = r#"{"table":"t","columns":[{"name":"id"}]}"#;
        let schema: TableSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.columns[0].column_type, ColumnType::Any);
        assert!(!schema.columns[0].primary_key);
    }

    #[test]
    fn test_primary_key_lookup() {
        let schema = TableSchema::new("t")
            .with_column(ColumnSpec::new("a", ColumnType::Text))
            .with_column(ColumnSpec::new("b", ColumnType::Integer).primary_key());
        assert_eq!(schema.primary_key().unwrap().name, "b");

        let without = TableSchema::new("t").with_column(ColumnSpec::new("a", ColumnType::Text));
        assert!(without.primary_key().is_none());
    }
}
