//! Migration lifecycle operations.
//!
//! Provides [`Migrator`] for the backup-drop-recreate-restore cycle that
//! changes a table's column constraints without losing its rows. The
//! orchestrated [`migrate`](Migrator::migrate) operation runs the four
//! steps in strict sequence — export, drop, create, import — and succeeds
//! only if the exported and imported row counts match exactly. The backup
//! artifact is written before anything destructive runs, so the original
//! data stays recoverable after a failure in any later step.
//!
//! # Example
//!
//! ```no_run
//! use rusqlite::Connection;
//! use table_migrate_core::{ColumnSpec, ColumnType, TableSchema};
//! use table_migrate_sqlite::Migrator;
//!
//! let conn = Connection::open("discord_bot.db").unwrap();
//! let mut migrator = Migrator::new(conn, "backups/").unwrap();
//!
//! // Same columns as before, minus the uniqueness constraint on user_id.
//! let relaxed = TableSchema::new("user_channels")
//!     .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key())
//!     .with_column(ColumnSpec::new("user_id", ColumnType::Text))
//!     .with_column(ColumnSpec::new("channel_id", ColumnType::Text))
//!     .with_column(ColumnSpec::new("last_race_time", ColumnType::Text))
//!     .with_column(ColumnSpec::new("display_name", ColumnType::Text));
//!
//! let report = migrator.migrate("user_channels", &relaxed).unwrap();
//! assert_eq!(report.rows_exported, report.rows_imported);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use rusqlite::types::ValueRef;
use tracing::{debug, info};

use table_migrate_backup::{BackupManifest, artifact_path, manifest_path, read_artifact, write_artifact};
use table_migrate_core::{ColumnSpec, TableSchema};

use crate::error::{ExportError, ImportError, MigrateError, SchemaError};
use crate::schema::{
    generate_create_sql, generate_drop_sql, table_exists, table_row_count, table_schema,
};

/// One step of the migration sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    /// Snapshot the table into the backup artifact.
    Export,
    /// Verify the new schema against the old table before anything
    /// destructive runs.
    Check,
    /// Drop the old table.
    Drop,
    /// Create the table with the new schema.
    Create,
    /// Reload rows from the backup artifact.
    Import,
    /// Compare exported and imported row counts.
    Verify,
}

impl MigrationStep {
    /// The state the migration had reached when this step started; on
    /// failure the database is left in this state.
    pub fn prior_state(&self) -> MigrationState {
        match self {
            MigrationStep::Export => MigrationState::Idle,
            MigrationStep::Check | MigrationStep::Drop => MigrationState::Exported,
            MigrationStep::Create => MigrationState::Dropped,
            MigrationStep::Import | MigrationStep::Verify => MigrationState::Created,
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationStep::Export => "export",
            MigrationStep::Check => "schema check",
            MigrationStep::Drop => "drop",
            MigrationStep::Create => "create",
            MigrationStep::Import => "import",
            MigrationStep::Verify => "verify",
        };
        f.write_str(name)
    }
}

/// State of a migration run.
///
/// Progresses `Idle → Exported → Dropped → Created → Imported`; any step
/// failure is terminal and recorded as `Failed` with the step that broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// No step has run.
    Idle,
    /// The backup artifact has been written; the table is untouched.
    Exported,
    /// The old table has been dropped.
    Dropped,
    /// The new table exists but holds no rows.
    Created,
    /// All rows reloaded and counts verified (terminal success).
    Imported,
    /// A step failed (terminal).
    Failed(MigrationStep),
}

impl MigrationState {
    /// Human-readable state name.
    pub fn describe(&self) -> String {
        match self {
            MigrationState::Idle => "idle".to_string(),
            MigrationState::Exported => "exported".to_string(),
            MigrationState::Dropped => "dropped".to_string(),
            MigrationState::Created => "created".to_string(),
            MigrationState::Imported => "imported".to_string(),
            MigrationState::Failed(step) => format!("failed during {step}"),
        }
    }
}

/// Report of an export: the introspected source schema, the row count, and
/// where the artifact landed.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Table that was exported.
    pub table: String,
    /// Schema of the source table at export time.
    pub schema: TableSchema,
    /// Rows written to the artifact.
    pub rows_exported: usize,
    /// Backup artifact path.
    pub artifact: PathBuf,
    /// Manifest sidecar path.
    pub manifest: PathBuf,
}

/// Report of a completed migration.
///
/// Produced only when the exported and imported row counts match; a
/// mismatch surfaces as [`MigrateError::Integrity`] instead.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// Table that was migrated.
    pub table: String,
    /// Rows written to the backup artifact.
    pub rows_exported: usize,
    /// Rows reloaded into the recreated table.
    pub rows_imported: usize,
    /// Backup artifact path, retained for the operator to discard.
    pub artifact: PathBuf,
}

/// Status snapshot of a table, as reported by
/// [`Migrator::status`].
#[derive(Debug, Clone)]
pub struct TableStatus {
    /// Table name.
    pub table: String,
    /// Whether the table exists.
    pub exists: bool,
    /// Current row count (0 when absent).
    pub row_count: usize,
    /// Introspected column definitions (empty when absent).
    pub columns: Vec<ColumnSpec>,
}

/// Runs migration steps against a SQLite database.
///
/// Owns the connection for the duration of the run. The orchestrated
/// [`migrate`](Self::migrate) drives the full sequence; the individual
/// step methods are public so an operator can replay a single step after
/// inspecting a failed run.
///
/// The migrator assumes exclusive access to the database: nothing else
/// may write to the table between export and import.
pub struct Migrator {
    conn: Connection,
    backup_dir: PathBuf,
    state: MigrationState,
}

impl Migrator {
    /// Creates a migrator writing backup artifacts into `backup_dir`.
    ///
    /// The directory must already exist; artifact paths inside it are
    /// derived from the table name.
    pub fn new(conn: Connection, backup_dir: impl Into<PathBuf>) -> Result<Self, SchemaError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            backup_dir: backup_dir.into(),
            state: MigrationState::Idle,
        })
    }

    /// State reached by the most recent [`migrate`](Self::migrate) run.
    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// Snapshots all rows of `table` into the backup artifact, plus a JSON
    /// manifest sidecar.
    ///
    /// Does not modify the database. Overwrites any previous artifact for
    /// the same table. Exporting an unchanged table twice produces
    /// identical artifact bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the table does not exist, a value cannot
    /// be represented in the artifact, or the backup location is not
    /// writable.
    pub fn export(&mut self, table: &str) -> Result<ExportReport, ExportError> {
        let schema = table_schema(&self.conn, table)?;
        let columns: Vec<String> = schema.columns.iter().map(|c| c.name.clone()).collect();

        let mut stmt = self.conn.prepare(&format!("SELECT * FROM {table}"))?;
        let mut query_rows = stmt.query([])?;
        let mut data: Vec<Vec<Option<String>>> = Vec::new();
        while let Some(row) = query_rows.next()? {
            let mut fields = Vec::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                let value = match row.get_ref(index)? {
                    ValueRef::Null => None,
                    ValueRef::Integer(v) => Some(v.to_string()),
                    ValueRef::Real(v) => Some(v.to_string()),
                    ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                        Ok(text) => Some(text.to_string()),
                        Err(_) => {
                            return Err(ExportError::NonUtf8Text {
                                table: table.to_string(),
                                column: column.clone(),
                            });
                        }
                    },
                    ValueRef::Blob(_) => {
                        return Err(ExportError::UnsupportedBlob {
                            table: table.to_string(),
                            column: column.clone(),
                        });
                    }
                };
                fields.push(value);
            }
            data.push(fields);
        }
        drop(query_rows);
        drop(stmt);

        let artifact = artifact_path(&self.backup_dir, table);
        let manifest = manifest_path(&self.backup_dir, table);
        let rows_exported = write_artifact(&artifact, &columns, &data)?;
        BackupManifest::new(table, schema.clone(), rows_exported).save(&manifest)?;

        info!(table, rows = rows_exported, path = %artifact.display(), "exported table snapshot");
        Ok(ExportReport {
            table: table.to_string(),
            schema,
            rows_exported,
            artifact,
            manifest,
        })
    }

    /// Drops `table`.
    ///
    /// With `missing_ok` an absent table is treated as success; otherwise
    /// dropping a missing table fails with [`SchemaError::TableMissing`] so
    /// a typo cannot masquerade as a completed step.
    pub fn drop_table(&mut self, table: &str, missing_ok: bool) -> Result<(), SchemaError> {
        let sql = generate_drop_sql(table, missing_ok)?;
        if !missing_ok && !table_exists(&self.conn, table)? {
            return Err(SchemaError::TableMissing(table.to_string()));
        }
        debug!(table, "dropping table");
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Creates the table described by `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Invalid`] for a malformed schema — checked
    /// before any SQL runs — and [`SchemaError::TableExists`] if the table
    /// is already present.
    pub fn create_table(&mut self, schema: &TableSchema) -> Result<(), SchemaError> {
        let sql = generate_create_sql(schema)?;
        if table_exists(&self.conn, &schema.table)? {
            return Err(SchemaError::TableExists(schema.table.clone()));
        }
        debug!(table = %schema.table, "creating table");
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Reloads rows from the backup artifact at `artifact` into `table`,
    /// returning how many rows were inserted.
    ///
    /// Artifact columns are mapped to table columns by name, never by
    /// position; table columns absent from the artifact are left NULL. The
    /// whole reload runs in one transaction, so a failed import leaves the
    /// table exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] if the table does not exist, the artifact is
    /// missing or malformed, or an artifact column has no counterpart in
    /// the table.
    pub fn import(&mut self, table: &str, artifact: &Path) -> Result<usize, ImportError> {
        let schema = table_schema(&self.conn, table)?;
        let snapshot = read_artifact(artifact)?;

        for column in &snapshot.columns {
            if schema.find_column(column).is_none() {
                return Err(ImportError::UnknownColumn {
                    table: table.to_string(),
                    column: column.clone(),
                });
            }
        }

        let placeholders: Vec<String> = (1..=snapshot.columns.len())
            .map(|i| format!("?{i}"))
            .collect();
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            snapshot.columns.join(", "),
            placeholders.join(", ")
        );

        let tx = self.conn.transaction()?;
        let mut imported = 0usize;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in &snapshot.rows {
                stmt.execute(rusqlite::params_from_iter(row.iter()))?;
                imported += 1;
            }
        }
        tx.commit()?;

        info!(table, rows = imported, "imported rows from backup artifact");
        Ok(imported)
    }

    /// Reports whether `table` exists, its row count, and its columns.
    pub fn status(&self, table: &str) -> Result<TableStatus, SchemaError> {
        if !table_exists(&self.conn, table)? {
            return Ok(TableStatus {
                table: table.to_string(),
                exists: false,
                row_count: 0,
                columns: Vec::new(),
            });
        }
        let schema = table_schema(&self.conn, table)?;
        let row_count = table_row_count(&self.conn, table)?;
        Ok(TableStatus {
            table: table.to_string(),
            exists: true,
            row_count,
            columns: schema.columns,
        })
    }

    /// Runs the full migration sequence: export → drop → create → import,
    /// then verifies the row-count invariant.
    ///
    /// Before the destructive drop, the old table's primary key column is
    /// checked against the new schema; a schema that drops it fails with
    /// the original table fully intact. On any failure the sequence halts
    /// immediately, [`state`](Self::state) records the step that broke,
    /// and the backup artifact is left in place for inspection and replay.
    ///
    /// Re-running after a post-drop failure resumes from the retained
    /// artifact: when the table is absent but its backup artifact exists,
    /// export and drop are skipped and the run continues with create and
    /// import.
    pub fn migrate(
        &mut self,
        table: &str,
        new_schema: &TableSchema,
    ) -> Result<MigrationReport, MigrateError> {
        self.state = MigrationState::Idle;
        let result = self.run_steps(table, new_schema);
        if let Err(err) = &result {
            self.state = MigrationState::Failed(err.step());
        }
        result
    }

    fn run_steps(
        &mut self,
        table: &str,
        new_schema: &TableSchema,
    ) -> Result<MigrationReport, MigrateError> {
        if new_schema.table != table {
            return Err(MigrateError::Check(SchemaError::TableMismatch {
                expected: table.to_string(),
                found: new_schema.table.clone(),
            }));
        }

        let (rows_exported, old_schema, artifact) = self.snapshot_source(table)?;

        if let Some(pk) = old_schema.as_ref().and_then(|s| s.primary_key()) {
            if new_schema.find_column(&pk.name).is_none() {
                return Err(MigrateError::Check(SchemaError::PrimaryKeyNotPreserved {
                    table: table.to_string(),
                    column: pk.name.clone(),
                }));
            }
        }

        if self.state == MigrationState::Exported {
            self.drop_table(table, false).map_err(MigrateError::Drop)?;
            self.state = MigrationState::Dropped;
        }

        self.create_table(new_schema).map_err(MigrateError::Create)?;
        self.state = MigrationState::Created;

        let rows_imported = self.import(table, &artifact)?;

        if rows_imported != rows_exported {
            return Err(MigrateError::Integrity {
                exported: rows_exported,
                imported: rows_imported,
            });
        }
        self.state = MigrationState::Imported;

        info!(
            table,
            exported = rows_exported,
            imported = rows_imported,
            "migration complete"
        );
        Ok(MigrationReport {
            table: table.to_string(),
            rows_exported,
            rows_imported,
            artifact,
        })
    }

    /// Exports the table, or — when the table is absent but a backup
    /// artifact from an earlier interrupted run exists — resumes from that
    /// artifact instead of failing.
    fn snapshot_source(
        &mut self,
        table: &str,
    ) -> Result<(usize, Option<TableSchema>, PathBuf), MigrateError> {
        let exists = table_exists(&self.conn, table)
            .map_err(|e| MigrateError::Export(ExportError::Database(e)))?;

        if exists {
            let export = self.export(table)?;
            self.state = MigrationState::Exported;
            return Ok((export.rows_exported, Some(export.schema), export.artifact));
        }

        let artifact = artifact_path(&self.backup_dir, table);
        if !artifact.exists() {
            return Err(MigrateError::Export(ExportError::Schema(
                SchemaError::TableMissing(table.to_string()),
            )));
        }

        let snapshot = read_artifact(&artifact).map_err(ExportError::Artifact)?;
        let old_schema = BackupManifest::load(&manifest_path(&self.backup_dir, table))
            .ok()
            .map(|manifest| manifest.schema);
        info!(
            table,
            rows = snapshot.row_count(),
            "table absent, resuming from retained backup artifact"
        );
        self.state = MigrationState::Dropped;
        Ok((snapshot.row_count(), old_schema, artifact))
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the migrator and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }
}
