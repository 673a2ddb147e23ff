//! Error types for migration and store operations.
//!
//! The taxonomy follows the migration steps: [`ExportError`],
//! [`SchemaError`] (drop/create preconditions and malformed schemas),
//! [`ImportError`], and the per-step wrapper [`MigrateError`] whose
//! [`Integrity`](MigrateError::Integrity) variant reports a row-count
//! mismatch after an otherwise successful import.

use thiserror::Error;

use table_migrate_backup::ArtifactError;
use table_migrate_core::ValidationError;

use crate::migrate::MigrationStep;

/// Errors raised by the export step.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Table lookup or introspection failure (missing table, invalid name).
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Reading rows from the source table failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Writing the backup artifact or manifest failed.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// A BLOB value cannot be represented in a delimited text artifact.
    #[error("blob value in column '{column}' of table '{table}' cannot be exported")]
    UnsupportedBlob {
        /// Source table.
        table: String,
        /// Column holding the blob.
        column: String,
    },

    /// A text value is not valid UTF-8 and would not survive the round trip.
    #[error("non-UTF-8 text in column '{column}' of table '{table}' cannot be exported")]
    NonUtf8Text {
        /// Source table.
        table: String,
        /// Column holding the value.
        column: String,
    },
}

/// Errors raised by schema-level operations: drop/create preconditions,
/// malformed schema definitions, and table introspection.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The table does not exist.
    #[error("table not found: {0}")]
    TableMissing(String),

    /// The table already exists.
    #[error("table already exists: {0}")]
    TableExists(String),

    /// The table name is not a valid SQL identifier.
    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),

    /// The schema definition failed structural validation.
    #[error("invalid schema: {0}")]
    Invalid(#[from] ValidationError),

    /// The schema's table name does not match the table being migrated.
    #[error("schema is for table '{found}', expected '{expected}'")]
    TableMismatch {
        /// Table the operation targets.
        expected: String,
        /// Table named by the schema definition.
        found: String,
    },

    /// The old table's primary key column is absent from the new schema.
    #[error("primary key column '{column}' of table '{table}' is missing from the new schema")]
    PrimaryKeyNotPreserved {
        /// Table being migrated.
        table: String,
        /// Primary key column that must be preserved.
        column: String,
    },

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Errors raised by the import step.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Table lookup failure (missing table, invalid name).
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The backup artifact is missing or malformed.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// An artifact column does not exist in the target table.
    #[error("artifact column '{column}' does not exist in table '{table}'")]
    UnknownColumn {
        /// Target table.
        table: String,
        /// Artifact column with no counterpart.
        column: String,
    },

    /// Inserting rows failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Per-step error wrapper returned by
/// [`Migrator::migrate`](crate::Migrator::migrate).
///
/// Each variant names the step that failed; [`MigrateError::step`] exposes
/// it programmatically so callers can report which intermediate state the
/// database was left in.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// The export step failed; the database is untouched.
    #[error("export step failed: {0}")]
    Export(#[from] ExportError),

    /// The pre-drop schema check failed; the database is untouched.
    #[error("schema check failed: {0}")]
    Check(SchemaError),

    /// The drop step failed.
    #[error("drop step failed: {0}")]
    Drop(SchemaError),

    /// The create step failed; the table has been dropped and must be
    /// restored from the backup artifact.
    #[error("create step failed: {0}")]
    Create(SchemaError),

    /// The import step failed; the new table exists but holds no rows.
    #[error("import step failed: {0}")]
    Import(#[from] ImportError),

    /// Exported and imported row counts differ.
    #[error("integrity check failed: exported {exported} row(s) but imported {imported}")]
    Integrity {
        /// Rows written to the backup artifact.
        exported: usize,
        /// Rows inserted into the new table.
        imported: usize,
    },
}

impl MigrateError {
    /// The migration step this error occurred in.
    pub fn step(&self) -> MigrationStep {
        match self {
            MigrateError::Export(_) => MigrationStep::Export,
            MigrateError::Check(_) => MigrationStep::Check,
            MigrateError::Drop(_) => MigrationStep::Drop,
            MigrateError::Create(_) => MigrationStep::Create,
            MigrateError::Import(_) => MigrationStep::Import,
            MigrateError::Integrity { .. } => MigrationStep::Verify,
        }
    }
}

/// Errors raised by [`ChannelStore`](crate::ChannelStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}
