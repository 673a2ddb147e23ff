use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use table_migrate_backup::artifact_path;
use table_migrate_core::{ColumnSpec, TableSchema};
use table_migrate_sqlite::Migrator;

#[derive(Debug, Parser)]
#[command(name = "table-migrate")]
#[command(about = "Safe SQLite table migration with backup artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full migration: export, drop, create, import, verify.
    Migrate(MigrateArgs),
    /// Snapshot a table into a backup artifact without modifying it.
    Export(ExportArgs),
    /// Drop a table.
    Drop(DropArgs),
    /// Create a table from a schema definition.
    Create(CreateArgs),
    /// Reload rows from a backup artifact into a table.
    Import(ImportArgs),
    /// Show a table's existence, row count, and columns.
    Status(StatusArgs),
}

#[derive(Debug, Args)]
struct SchemaInput {
    /// Path to a JSON schema definition file.
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Inline column specification `name:type[:flag,...]` (repeatable).
    /// Types: integer|text|real|blob|any. Flags: pk, unique, notnull.
    #[arg(long = "column")]
    columns: Vec<String>,
}

#[derive(Debug, Args)]
struct MigrateArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table to migrate.
    #[arg(long)]
    table: String,
    /// Directory for the backup artifact and manifest.
    #[arg(long, default_value = ".")]
    backup_dir: PathBuf,
    #[command(flatten)]
    schema: SchemaInput,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table to export.
    #[arg(long)]
    table: String,
    /// Directory for the backup artifact and manifest.
    #[arg(long, default_value = ".")]
    backup_dir: PathBuf,
}

#[derive(Debug, Args)]
struct DropArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table to drop.
    #[arg(long)]
    table: String,
    /// Treat an already-absent table as success.
    #[arg(long)]
    missing_ok: bool,
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table name (required with --column; a JSON schema carries its own).
    #[arg(long)]
    table: Option<String>,
    #[command(flatten)]
    schema: SchemaInput,
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table to import into.
    #[arg(long)]
    table: String,
    /// Backup artifact path (default: derived from the table name in
    /// --backup-dir).
    #[arg(long)]
    artifact: Option<PathBuf>,
    /// Directory holding the backup artifact.
    #[arg(long, default_value = ".")]
    backup_dir: PathBuf,
}

#[derive(Debug, Args)]
struct StatusArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table to inspect.
    #[arg(long)]
    table: String,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate(args) => run_migrate(args),
        Command::Export(args) => run_export(args),
        Command::Drop(args) => run_drop(args),
        Command::Create(args) => run_create(args),
        Command::Import(args) => run_import(args),
        Command::Status(args) => run_status(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn open_migrator(db: &Path, backup_dir: &Path) -> Result<Migrator, String> {
    fs::create_dir_all(backup_dir).map_err(|err| {
        format!(
            "Failed to create backup directory '{}': {err}",
            backup_dir.display()
        )
    })?;
    let conn = rusqlite::Connection::open(db)
        .map_err(|err| format!("Failed to open database '{}': {err}", db.display()))?;
    Migrator::new(conn, backup_dir).map_err(|err| format!("Failed to initialize migrator: {err}"))
}

fn resolve_schema(input: &SchemaInput, table: Option<&str>) -> Result<TableSchema, String> {
    match (&input.schema, input.columns.is_empty()) {
        (Some(_), false) => {
            Err("Specify either --schema or --column, not both".to_string())
        }
        (Some(path), true) => {
            let raw = fs::read_to_string(path)
                .map_err(|err| format!("Failed to read schema '{}': {err}", path.display()))?;
            serde_json::from_str(&raw)
                .map_err(|err| format!("Failed to parse schema '{}': {err}", path.display()))
        }
        (None, false) => {
            let table = table
                .ok_or_else(|| "--table is required with --column".to_string())?;
            let mut schema = TableSchema::new(table);
            for spec in &input.columns {
                let column = ColumnSpec::parse(spec)
                    .map_err(|err| format!("Invalid column spec '{spec}': {err}"))?;
                schema.columns.push(column);
            }
            Ok(schema)
        }
        (None, true) => Err("A schema definition is required: --schema or --column".to_string()),
    }
}

fn run_migrate(args: MigrateArgs) -> Result<(), String> {
    let schema = resolve_schema(&args.schema, Some(&args.table))?;
    let mut migrator = open_migrator(&args.db, &args.backup_dir)?;

    match migrator.migrate(&args.table, &schema) {
        Ok(report) => {
            println!("Migration complete for table '{}':", report.table);
            println!("  Rows exported: {}", report.rows_exported);
            println!("  Rows imported: {}", report.rows_imported);
            println!("  Backup artifact: {}", report.artifact.display());
            println!("The backup artifact can be deleted once the result is confirmed.");
            Ok(())
        }
        Err(err) => {
            let mut message = format!("{err}");
            message.push_str(&format!(
                "\n  database state: {}",
                migrator.state().describe()
            ));
            let artifact = artifact_path(&args.backup_dir, &args.table);
            if artifact.exists() {
                message.push_str(&format!(
                    "\n  backup artifact retained at '{}'",
                    artifact.display()
                ));
            }
            Err(message)
        }
    }
}

fn run_export(args: ExportArgs) -> Result<(), String> {
    let mut migrator = open_migrator(&args.db, &args.backup_dir)?;
    let report = migrator
        .export(&args.table)
        .map_err(|err| format!("export failed: {err}"))?;
    println!("Exported {} row(s) from '{}'.", report.rows_exported, report.table);
    println!("  Backup artifact: {}", report.artifact.display());
    println!("  Manifest: {}", report.manifest.display());
    Ok(())
}

fn run_drop(args: DropArgs) -> Result<(), String> {
    let conn = rusqlite::Connection::open(&args.db)
        .map_err(|err| format!("Failed to open database '{}': {err}", args.db.display()))?;
    let mut migrator = Migrator::new(conn, ".")
        .map_err(|err| format!("Failed to initialize migrator: {err}"))?;
    migrator
        .drop_table(&args.table, args.missing_ok)
        .map_err(|err| format!("drop failed: {err}"))?;
    println!("Dropped table '{}'.", args.table);
    Ok(())
}

fn run_create(args: CreateArgs) -> Result<(), String> {
    let schema = resolve_schema(&args.schema, args.table.as_deref())?;
    let conn = rusqlite::Connection::open(&args.db)
        .map_err(|err| format!("Failed to open database '{}': {err}", args.db.display()))?;
    let mut migrator = Migrator::new(conn, ".")
        .map_err(|err| format!("Failed to initialize migrator: {err}"))?;
    migrator
        .create_table(&schema)
        .map_err(|err| format!("create failed: {err}"))?;
    println!(
        "Created table '{}' with {} column(s).",
        schema.table,
        schema.columns.len()
    );
    Ok(())
}

fn run_import(args: ImportArgs) -> Result<(), String> {
    let artifact = args
        .artifact
        .unwrap_or_else(|| artifact_path(&args.backup_dir, &args.table));
    let mut migrator = open_migrator(&args.db, &args.backup_dir)?;
    let imported = migrator
        .import(&args.table, &artifact)
        .map_err(|err| format!("import failed: {err}"))?;
    println!(
        "Imported {imported} row(s) into '{}' from '{}'.",
        args.table,
        artifact.display()
    );
    Ok(())
}

fn run_status(args: StatusArgs) -> Result<(), String> {
    let conn = rusqlite::Connection::open(&args.db)
        .map_err(|err| format!("Failed to open database '{}': {err}", args.db.display()))?;
    let migrator = Migrator::new(conn, ".")
        .map_err(|err| format!("Failed to initialize migrator: {err}"))?;
    let status = migrator
        .status(&args.table)
        .map_err(|err| format!("status failed: {err}"))?;

    println!("Table '{}':", status.table);
    println!("  Exists: {}", if status.exists { "yes" } else { "no" });
    println!("  Rows: {}", status.row_count);
    if !status.columns.is_empty() {
        println!("  Columns:");
        for column in &status.columns {
            println!("    {}", describe_column(column));
        }
    }
    Ok(())
}

fn describe_column(column: &ColumnSpec) -> String {
    let mut parts = vec![column.name.clone()];
    if let Some(ty) = column.column_type.sql_name() {
        parts.push(ty.to_string());
    }
    if column.primary_key {
        parts.push("PRIMARY KEY".to_string());
    }
    if column.not_null {
        parts.push("NOT NULL".to_string());
    }
    if column.unique {
        parts.push("UNIQUE".to_string());
    }
    if let Some(default) = &column.default_value {
        parts.push(format!("DEFAULT {default}"));
    }
    parts.join(" ")
}
