//! Safe SQLite table migration with backup artifacts and a row-count
//! invariant.
//!
//! This crate implements the backup-drop-recreate-restore cycle used to
//! change a table's column constraints without losing its rows, plus the
//! subscription store that table serves.
//!
//! # Architecture
//!
//! - **`schema`** — `CREATE`/`DROP` SQL generation from validated schema
//!   definitions, and live-table introspection via `PRAGMA table_info`.
//! - **`migrate`** — [`Migrator`] with the export → drop → create → import
//!   sequence, an explicit [`MigrationState`] machine, and per-step errors.
//! - **`store`** — [`ChannelStore`], typed access to the `user_channels`
//!   subscription table.
//!
//! # Quick start
//!
//! ```no_run
//! use rusqlite::Connection;
//! use table_migrate_core::{ColumnSpec, ColumnType, TableSchema};
//! use table_migrate_sqlite::Migrator;
//!
//! let conn = Connection::open("discord_bot.db").unwrap();
//! let mut migrator = Migrator::new(conn, "backups/").unwrap();
//!
//! let relaxed = TableSchema::new("user_channels")
//!     .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key())
//!     .with_column(ColumnSpec::new("user_id", ColumnType::Text))
//!     .with_column(ColumnSpec::new("channel_id", ColumnType::Text))
//!     .with_column(ColumnSpec::new("last_race_time", ColumnType::Text))
//!     .with_column(ColumnSpec::new("display_name", ColumnType::Text));
//!
//! let report = migrator.migrate("user_channels", &relaxed).unwrap();
//! println!("exported {} rows, imported {}", report.rows_exported, report.rows_imported);
//! ```

mod error;
mod migrate;
mod schema;
mod store;

pub use error::{ExportError, ImportError, MigrateError, SchemaError, StoreError};
pub use migrate::{
    ExportReport, MigrationReport, MigrationState, MigrationStep, Migrator, TableStatus,
};
pub use schema::{
    generate_create_sql, generate_drop_sql, table_exists, table_row_count, table_schema,
};
pub use store::{ChannelStore, USER_CHANNELS_TABLE, UserChannel};
