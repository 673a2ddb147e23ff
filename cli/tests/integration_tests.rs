use std::fs;
use std::path::PathBuf;
use std::process::Output;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("table_migrate_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_table-migrate"))
        .args(args)
        .output()
        .expect("failed to run table-migrate")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Creates the legacy user_channels table (unique user_id) and loads two
/// rows into it through the binary.
fn seed_legacy_table(dir: &TempDir, db: &str) {
    let db_path = dir.join(db);
    let db_arg = db_path.to_str().unwrap().to_string();
    let backup_arg = dir.path.to_str().unwrap().to_string();

    let output = run(&[
        "create",
        "--db",
        &db_arg,
        "--table",
        "user_channels",
        "--column",
        "id:integer:pk",
        "--column",
        "user_id:text:unique",
        "--column",
        "channel_id:text",
        "--column",
        "last_race_time:text",
        "--column",
        "display_name:text",
    ]);
    assert!(output.status.success(), "create failed: {}", stderr(&output));

    fs::write(
        dir.join("user_channels.backup.csv"),
        "id,user_id,channel_id,last_race_time,display_name\n\
         1,u1,c1,2024-01-01,Alice\n\
         2,u2,c2,2024-01-02,\"Smith, Jr.\"\n",
    )
    .unwrap();

    let output = run(&[
        "import",
        "--db",
        &db_arg,
        "--table",
        "user_channels",
        "--backup-dir",
        &backup_arg,
    ]);
    assert!(output.status.success(), "import failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Imported 2 row(s)"));
}

#[test]
fn migrate_end_to_end_reports_matching_counts() {
    let dir = TempDir::new("migrate_ok");
    seed_legacy_table(&dir, "bot.db");
    let db_arg = dir.join("bot.db").to_str().unwrap().to_string();
    let backup_arg = dir.path.to_str().unwrap().to_string();

    let output = run(&[
        "migrate",
        "--db",
        &db_arg,
        "--table",
        "user_channels",
        "--backup-dir",
        &backup_arg,
        "--column",
        "id:integer:pk",
        "--column",
        "user_id:text",
        "--column",
        "channel_id:text",
        "--column",
        "last_race_time:text",
        "--column",
        "display_name:text",
    ]);
    assert!(output.status.success(), "migrate failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Rows exported: 2"));
    assert!(out.contains("Rows imported: 2"));

    // The constraint is gone and both rows survived.
    let output = run(&["status", "--db", &db_arg, "--table", "user_channels"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Rows: 2"));
    assert!(out.contains("id INTEGER PRIMARY KEY"));
    assert!(!out.contains("user_id TEXT UNIQUE"));
}

#[test]
fn migrate_missing_table_names_failing_step() {
    let dir = TempDir::new("migrate_missing");
    let db_arg = dir.join("empty.db").to_str().unwrap().to_string();
    let backup_arg = dir.path.to_str().unwrap().to_string();

    let output = run(&[
        "migrate",
        "--db",
        &db_arg,
        "--table",
        "user_channels",
        "--backup-dir",
        &backup_arg,
        "--column",
        "id:integer:pk",
    ]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("export step failed"), "stderr: {err}");
    assert!(err.contains("table not found"), "stderr: {err}");
}

#[test]
fn migrate_refuses_to_drop_primary_key_column() {
    let dir = TempDir::new("migrate_pk");
    seed_legacy_table(&dir, "bot.db");
    let db_arg = dir.join("bot.db").to_str().unwrap().to_string();
    let backup_arg = dir.path.to_str().unwrap().to_string();

    let output = run(&[
        "migrate",
        "--db",
        &db_arg,
        "--table",
        "user_channels",
        "--backup-dir",
        &backup_arg,
        "--column",
        "user_id:text:pk",
        "--column",
        "channel_id:text",
    ]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("schema check failed"), "stderr: {err}");
    assert!(err.contains("backup artifact retained"), "stderr: {err}");

    // Nothing destructive ran.
    let output = run(&["status", "--db", &db_arg, "--table", "user_channels"]);
    assert!(stdout(&output).contains("Rows: 2"));
}

#[test]
fn drop_missing_table_fails_unless_requested() {
    let dir = TempDir::new("drop_missing");
    let db_arg = dir.join("empty.db").to_str().unwrap().to_string();

    let output = run(&["drop", "--db", &db_arg, "--table", "ghost"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("table not found"));

    let output = run(&["drop", "--db", &db_arg, "--table", "ghost", "--missing-ok"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn create_rejects_schema_without_primary_key() {
    let dir = TempDir::new("create_no_pk");
    let db_arg = dir.join("empty.db").to_str().unwrap().to_string();

    let output = run(&[
        "create",
        "--db",
        &db_arg,
        "--table",
        "t",
        "--column",
        "a:text",
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("primary key"));
}

#[test]
fn create_accepts_json_schema_file() {
    let dir = TempDir::new("create_json");
    let db_arg = dir.join("empty.db").to_str().unwrap().to_string();

    let schema_path = dir.join("schema.json");
    fs::write(
        &schema_path,
        r#"{
            "table": "user_channels",
            "columns": [
                {"name": "id", "column_type": "Integer", "primary_key": true},
                {"name": "user_id", "column_type": "Text"}
            ]
        }"#,
    )
    .unwrap();

    let output = run(&[
        "create",
        "--db",
        &db_arg,
        "--schema",
        schema_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Created table 'user_channels'"));

    let output = run(&["status", "--db", &db_arg, "--table", "user_channels"]);
    assert!(stdout(&output).contains("Exists: yes"));
}

#[test]
fn export_writes_artifact_and_manifest() {
    let dir = TempDir::new("export");
    seed_legacy_table(&dir, "bot.db");
    let db_arg = dir.join("bot.db").to_str().unwrap().to_string();
    let backup_arg = dir.path.to_str().unwrap().to_string();

    let output = run(&[
        "export",
        "--db",
        &db_arg,
        "--table",
        "user_channels",
        "--backup-dir",
        &backup_arg,
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Exported 2 row(s)"));
    assert!(dir.join("user_channels.backup.csv").exists());
    assert!(dir.join("user_channels.backup.json").exists());

    // The comma-bearing display name is quoted, not split.
    let text = fs::read_to_string(dir.join("user_channels.backup.csv")).unwrap();
    assert!(text.contains("\"Smith, Jr.\""));
}
