//! Error types for backup artifact operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while writing, reading, or decoding a backup
/// artifact or its manifest.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The artifact or manifest file could not be read.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact or manifest file could not be written.
    #[error("failed to write '{path}': {source}")]
    Write {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A quoted field was still open at end of input.
    #[error("record {record}: unterminated quoted field")]
    UnterminatedQuote {
        /// 1-based record number (the header is record 1).
        record: usize,
    },

    /// A quote character appeared where it cannot (inside an unquoted field,
    /// or directly after a closing quote).
    #[error("record {record}: stray quote character")]
    StrayQuote {
        /// 1-based record number (the header is record 1).
        record: usize,
    },

    /// A record's field count does not match the header.
    #[error("record {record}: expected {expected} field(s), found {found}")]
    FieldCountMismatch {
        /// 1-based record number (the header is record 1).
        record: usize,
        /// Field count declared by the header.
        expected: usize,
        /// Field count found in this record.
        found: usize,
    },

    /// The artifact has no usable header row.
    #[error("artifact has no header row")]
    EmptyHeader,

    /// Manifest (de)serialization failure.
    #[error("manifest serialization error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Convenience alias for results with [`ArtifactError`].
pub type Result<T> = std::result::Result<T, ArtifactError>;
