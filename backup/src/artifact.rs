//! Delimited-text serialization of table snapshots.
//!
//! The backup artifact is comma-delimited text: one header row with column
//! names, then one row per data record. Fields containing the delimiter, a
//! quote character, or a line break are quoted; embedded quote characters
//! are doubled. NULL is written as an unquoted empty field and the empty
//! string as a quoted empty field (`""`), so the two survive a round trip
//! as distinct values.
//!
//! Encoding is deterministic: the same snapshot always produces the same
//! bytes, which makes repeated exports of an unchanged table
//! byte-comparable.
//!
//! # Example
//!
//! ```
//! use table_migrate_backup::{decode, encode};
//!
//! let columns = vec!["id".to_string(), "display_name".to_string()];
//! let rows = vec![
//!     vec![Some("1".to_string()), Some("Smith, Jr.".to_string())],
//!     vec![Some("2".to_string()), None],
//! ];
//!
//! let text = encode(&columns, &rows);
//! let artifact = decode(&text).unwrap();
//! assert_eq!(artifact.columns, columns);
//! assert_eq!(artifact.rows, rows);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ArtifactError, Result};

/// Field delimiter used by the artifact format.
pub const DELIMITER: char = ',';

/// A decoded backup artifact: header columns plus data rows.
///
/// Each field is `Some(value)` for a present value (possibly empty) or
/// `None` for SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Column names from the header row, in artifact order.
    pub columns: Vec<String>,
    /// Data rows; every row has exactly `columns.len()` fields.
    pub rows: Vec<Vec<Option<String>>>,
}

impl Artifact {
    /// Number of data rows (the header is not counted).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Returns the deterministic artifact path for a table:
/// `<dir>/<table>.backup.csv`.
pub fn artifact_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.backup.csv"))
}

/// Returns the deterministic manifest path for a table:
/// `<dir>/<table>.backup.json`.
pub fn manifest_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.backup.json"))
}

fn push_field(out: &mut String, field: Option<&str>) {
    match field {
        // NULL: nothing at all.
        None => {}
        Some(value) if value.is_empty() || value.contains([DELIMITER, '"', '\n', '\r']) => {
            out.push('"');
            for ch in value.chars() {
                if ch == '"' {
                    out.push('"');
                }
                out.push(ch);
            }
            out.push('"');
        }
        Some(value) => out.push_str(value),
    }
}

/// Encodes a snapshot into artifact text.
///
/// The header row is written first; each data row must have exactly one
/// field per column (callers are expected to uphold this — [`decode`]
/// enforces it on the way back in).
pub fn encode(columns: &[String], rows: &[Vec<Option<String>>]) -> String {
    let mut out = String::new();

    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        push_field(&mut out, Some(column));
    }
    out.push('\n');

    for row in rows {
        for (i, field) in row.iter().enumerate() {
            if i > 0 {
                out.push(DELIMITER);
            }
            push_field(&mut out, field.as_deref());
        }
        out.push('\n');
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

fn parse_records(input: &str) -> Result<Vec<Vec<Option<String>>>> {
    let mut records: Vec<Vec<Option<String>>> = Vec::new();
    let mut record: Vec<Option<String>> = Vec::new();
    let mut field = String::new();
    let mut state = ParseState::FieldStart;

    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        // Normalize CRLF to LF outside quoted fields.
        let ch = if ch == '\r'
            && state != ParseState::Quoted
            && chars.peek() == Some(&'\n')
        {
            chars.next();
            '\n'
        } else {
            ch
        };

        match state {
            ParseState::FieldStart => match ch {
                '"' => state = ParseState::Quoted,
                DELIMITER => record.push(None),
                '\n' => {
                    record.push(None);
                    records.push(std::mem::take(&mut record));
                }
                other => {
                    field.push(other);
                    state = ParseState::Unquoted;
                }
            },
            ParseState::Unquoted => match ch {
                DELIMITER => {
                    record.push(Some(std::mem::take(&mut field)));
                    state = ParseState::FieldStart;
                }
                '\n' => {
                    record.push(Some(std::mem::take(&mut field)));
                    records.push(std::mem::take(&mut record));
                    state = ParseState::FieldStart;
                }
                '"' => {
                    return Err(ArtifactError::StrayQuote {
                        record: records.len() + 1,
                    });
                }
                other => field.push(other),
            },
            ParseState::Quoted => match ch {
                '"' => state = ParseState::QuoteInQuoted,
                other => field.push(other),
            },
            ParseState::QuoteInQuoted => match ch {
                '"' => {
                    field.push('"');
                    state = ParseState::Quoted;
                }
                DELIMITER => {
                    record.push(Some(std::mem::take(&mut field)));
                    state = ParseState::FieldStart;
                }
                '\n' => {
                    record.push(Some(std::mem::take(&mut field)));
                    records.push(std::mem::take(&mut record));
                    state = ParseState::FieldStart;
                }
                _ => {
                    return Err(ArtifactError::StrayQuote {
                        record: records.len() + 1,
                    });
                }
            },
        }
    }

    // End of input without a trailing newline.
    match state {
        ParseState::Quoted => {
            return Err(ArtifactError::UnterminatedQuote {
                record: records.len() + 1,
            });
        }
        ParseState::Unquoted | ParseState::QuoteInQuoted => {
            record.push(Some(field));
            records.push(record);
        }
        ParseState::FieldStart => {
            if !record.is_empty() {
                record.push(None);
                records.push(record);
            }
        }
    }

    Ok(records)
}

/// Decodes artifact text into an [`Artifact`].
///
/// # Errors
///
/// Returns [`ArtifactError::EmptyHeader`] if the input has no header row,
/// [`ArtifactError::FieldCountMismatch`] if any data record's field count
/// differs from the header, and quoting errors for malformed fields.
pub fn decode(input: &str) -> Result<Artifact> {
    let mut records = parse_records(input)?;
    if records.is_empty() {
        return Err(ArtifactError::EmptyHeader);
    }

    let header = records.remove(0);
    let columns: Vec<String> = header
        .into_iter()
        .map(|field| field.unwrap_or_default())
        .collect();
    if columns.len() == 1 && columns[0].is_empty() {
        return Err(ArtifactError::EmptyHeader);
    }

    for (index, row) in records.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(ArtifactError::FieldCountMismatch {
                record: index + 2,
                expected: columns.len(),
                found: row.len(),
            });
        }
    }

    Ok(Artifact {
        columns,
        rows: records,
    })
}

/// Writes a snapshot to the artifact file, overwriting any previous
/// artifact at that path. Returns the number of data rows written.
pub fn write_artifact(
    path: &Path,
    columns: &[String],
    rows: &[Vec<Option<String>>],
) -> Result<usize> {
    let text = encode(columns, rows);
    fs::write(path, text).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(rows.len())
}

/// Reads and decodes an artifact file.
pub fn read_artifact(path: &Path) -> Result<Artifact> {
    let text = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&text)
}
