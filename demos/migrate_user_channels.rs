//! Full migration walkthrough example.
//!
//! Demonstrates the complete lifecycle: seeding the legacy subscription
//! table, hitting the uniqueness constraint, migrating it away with a
//! backup-drop-recreate-restore cycle, and verifying the result.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p table-migrate-demos --example migrate_user_channels
//! ```

use rusqlite::Connection;
use table_migrate_backup::BackupManifest;
use table_migrate_core::{ColumnSpec, ColumnType, TableSchema};
use table_migrate_sqlite::{ChannelStore, Migrator};

fn main() {
    // === Step 1: Set up a scratch database with the legacy table ===
    let backup_dir = std::env::temp_dir().join("table_migrate_demo_backups");
    std::fs::create_dir_all(&backup_dir).unwrap();

    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE user_channels (
            id INTEGER PRIMARY KEY,
            user_id TEXT UNIQUE,
            channel_id TEXT,
            last_race_time TEXT,
            display_name TEXT
        );
        INSERT INTO user_channels (user_id, channel_id, display_name)
        VALUES ('u1', 'c1', 'Alice'),
               ('u2', 'c2', 'Smith, Jr.');",
    )
    .unwrap();

    // === Step 2: The legacy constraint blocks a second subscription ===
    println!("=== Legacy constraint ===");
    let store = ChannelStore::new(&conn);
    match store.save_user_channel("u1", "c2", "Alice") {
        Ok(()) => println!("unexpected: second subscription accepted"),
        Err(err) => println!("second subscription refused: {err}"),
    }

    // === Step 3: Migrate to the same columns without the constraint ===
    println!("\n=== Migration ===");
    let relaxed = TableSchema::new("user_channels")
        .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key())
        .with_column(ColumnSpec::new("user_id", ColumnType::Text))
        .with_column(ColumnSpec::new("channel_id", ColumnType::Text))
        .with_column(ColumnSpec::new("last_race_time", ColumnType::Text))
        .with_column(ColumnSpec::new("display_name", ColumnType::Text));

    let mut migrator = Migrator::new(conn, &backup_dir).unwrap();
    let report = migrator.migrate("user_channels", &relaxed).unwrap();
    println!("Rows exported: {}", report.rows_exported);
    println!("Rows imported: {}", report.rows_imported);
    println!("Backup artifact: {}", report.artifact.display());

    let manifest =
        BackupManifest::load(&table_migrate_backup::manifest_path(&backup_dir, "user_channels"))
            .unwrap();
    println!(
        "Manifest: table={} rows={} created_at={}",
        manifest.table, manifest.row_count, manifest.created_at
    );

    // === Step 4: The second subscription now works ===
    println!("\n=== After migration ===");
    let conn = migrator.into_connection();
    let store = ChannelStore::new(&conn);
    store.save_user_channel("u1", "c2", "Alice").unwrap();

    for record in store.user_channels().unwrap() {
        println!(
            "  #{} user={} channel={} name={}",
            record.id,
            record.user_id,
            record.channel_id,
            record.display_name.as_deref().unwrap_or("-")
        );
    }
    println!(
        "Channels with subscribers: {:?}",
        store.channel_ids().unwrap()
    );

    // Cleanup
    std::fs::remove_dir_all(&backup_dir).ok();
    println!("\nDone!");
}
