//! Backup artifact serialization and manifest management for table
//! migrations.
//!
//! A backup artifact is the durable snapshot of a table's rows taken before
//! a destructive schema change: delimited text with a header row, quoted
//! fields, and a NULL/empty-string distinction that makes the export/import
//! round trip byte-exact. A JSON manifest sidecar records the source table,
//! its columns, the row count, and when the export ran.
//!
//! # Quick start
//!
//! ```
//! use table_migrate_backup::{artifact_path, read_artifact, write_artifact, BackupManifest};
//! use table_migrate_core::{ColumnSpec, ColumnType, TableSchema};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = artifact_path(dir.path(), "user_channels");
//!
//! let columns = vec!["id".to_string(), "display_name".to_string()];
//! let rows = vec![vec![Some("1".to_string()), Some("Smith, Jr.".to_string())]];
//!
//! let written = write_artifact(&path, &columns, &rows).unwrap();
//! assert_eq!(written, 1);
//!
//! let artifact = read_artifact(&path).unwrap();
//! assert_eq!(artifact.rows, rows);
//!
//! let schema = TableSchema::new("user_channels")
//!     .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key())
//!     .with_column(ColumnSpec::new("display_name", ColumnType::Text));
//! let manifest = BackupManifest::new("user_channels", schema, written);
//! assert_eq!(manifest.row_count, 1);
//! ```

mod artifact;
mod error;
mod manifest;

pub use artifact::{
    Artifact, DELIMITER, artifact_path, decode, encode, manifest_path, read_artifact,
    write_artifact,
};
pub use error::{ArtifactError, Result};
pub use manifest::{BackupManifest, MANIFEST_FORMAT_VERSION};
