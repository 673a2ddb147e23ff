//! Backup manifest: a JSON sidecar describing an artifact.
//!
//! The manifest records what was exported and when, so an operator
//! inspecting a failed migration can tell which table the artifact came
//! from, which columns it holds, and how many rows it should contain
//! without parsing the artifact itself.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use table_migrate_core::TableSchema;

use crate::error::{ArtifactError, Result};

/// Current manifest format version.
pub const MANIFEST_FORMAT_VERSION: &str = "1";

/// Metadata sidecar for a backup artifact.
///
/// Carries the introspected schema of the source table, so a migration
/// resumed after the table was dropped can still check the new schema
/// against the old one.
///
/// # Examples
///
/// ```
/// use table_migrate_backup::BackupManifest;
/// use table_migrate_core::{ColumnSpec, ColumnType, TableSchema};
///
/// let schema = TableSchema::new("user_channels")
///     .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key());
/// let manifest = BackupManifest::new("user_channels", schema, 2);
/// assert_eq!(manifest.table, "user_channels");
/// assert_eq!(manifest.row_count, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupManifest {
    /// Manifest format version.
    pub format_version: String,
    /// Table the artifact was exported from.
    pub table: String,
    /// Schema of the source table at export time.
    pub schema: TableSchema,
    /// Number of data rows in the artifact.
    pub row_count: usize,
    /// RFC 3339 timestamp of when the export ran.
    pub created_at: String,
}

impl BackupManifest {
    /// Creates a manifest stamped with the current time.
    pub fn new(table: impl Into<String>, schema: TableSchema, row_count: usize) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION.to_string(),
            table: table.into(),
            schema,
            row_count,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Writes the manifest as pretty-printed JSON, overwriting any previous
    /// manifest at that path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}
