//! SQL generation and live-table introspection.
//!
//! Generates `CREATE TABLE` / `DROP TABLE` statements from validated
//! [`TableSchema`] definitions, and recovers a `TableSchema` from a live
//! table via `PRAGMA table_info` and its unique indexes. Table and column
//! names are interpolated into SQL, so every entry point validates them as
//! identifiers first.

use rusqlite::Connection;

use table_migrate_core::{
    ColumnSpec, ColumnType, TableSchema, is_valid_identifier, validate_schema,
};

use crate::error::SchemaError;

/// Checks whether a table exists, via the `sqlite_master` catalog.
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?;
    let count: i64 = stmt.query_row([table], |row| row.get(0))?;
    Ok(count > 0)
}

fn checked_identifier(table: &str) -> Result<&str, SchemaError> {
    if is_valid_identifier(table) {
        Ok(table)
    } else {
        Err(SchemaError::InvalidTableName(table.to_string()))
    }
}

/// Generates the `CREATE TABLE` statement for a schema definition.
///
/// # Errors
///
/// Returns [`SchemaError::Invalid`] if the schema fails structural
/// validation; no SQL is produced for a malformed schema.
pub fn generate_create_sql(schema: &TableSchema) -> Result<String, SchemaError> {
    if let Some(problem) = validate_schema(schema).into_iter().next() {
        return Err(SchemaError::Invalid(problem));
    }

    let mut columns = Vec::with_capacity(schema.columns.len());
    for column in &schema.columns {
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
        columns.push(parts.join(" "));
    }

    Ok(format!(
        "CREATE TABLE {} (\n    {}\n)",
        schema.table,
        columns.join(",\n    ")
    ))
}

/// Generates the `DROP TABLE` statement for a table.
///
/// With `if_exists` the statement uses `DROP TABLE IF EXISTS`, which is
/// safe to run against an absent table.
pub fn generate_drop_sql(table: &str, if_exists: bool) -> Result<String, SchemaError> {
    let table = checked_identifier(table)?;
    if if_exists {
        Ok(format!("DROP TABLE IF EXISTS {table}"))
    } else {
        Ok(format!("DROP TABLE {table}"))
    }
}

fn column_type_from_declared(declared: &str) -> ColumnType {
    let upper = declared.to_ascii_uppercase();
    if upper.is_empty() {
        ColumnType::Any
    } else if upper.contains("INT") {
        ColumnType::Integer
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        ColumnType::Text
    } else if upper.contains("BLOB") {
        ColumnType::Blob
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        ColumnType::Real
    } else {
        ColumnType::Any
    }
}

/// Recovers a [`TableSchema`] from a live table.
///
/// Column names, declared types, NOT NULL flags, defaults, and the primary
/// key come from `PRAGMA table_info`; single-column uniqueness constraints
/// are recovered from the table's unique indexes.
///
/// # Errors
///
/// Returns [`SchemaError::TableMissing`] if the table does not exist and
/// [`SchemaError::InvalidTableName`] for names that are not plain
/// identifiers.
pub fn table_schema(conn: &Connection, table: &str) -> Result<TableSchema, SchemaError> {
    let table = checked_identifier(table)?;
    if !table_exists(conn, table)? {
        return Err(SchemaError::TableMissing(table.to_string()));
    }

    let mut schema = TableSchema::new(table);
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get("name")?;
        let declared: String = row.get("type")?;
        let not_null: bool = row.get::<_, i64>("notnull")? != 0;
        let default: Option<String> = row.get("dflt_value")?;
        let pk: bool = row.get::<_, i64>("pk")? != 0;

        let mut column = ColumnSpec::new(name, column_type_from_declared(&declared));
        column.primary_key = pk;
        column.not_null = not_null;
        column.default_value = default;
        schema.columns.push(column);
    }

    for unique_column in unique_columns(conn, table)? {
        if let Some(column) = schema.columns.iter_mut().find(|c| c.name == unique_column) {
            column.unique = true;
        }
    }

    Ok(schema)
}

/// Columns covered by a single-column UNIQUE constraint.
fn unique_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut indexes = Vec::new();
    {
        let mut stmt = conn.prepare(&format!("PRAGMA index_list({table})"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            let unique: bool = row.get::<_, i64>("unique")? != 0;
            let origin: String = row.get("origin")?;
            if unique && origin == "u" {
                indexes.push(name);
            }
        }
    }

    let mut columns = Vec::new();
    for index in indexes {
        let mut stmt = conn.prepare(&format!("PRAGMA index_info({index})"))?;
        let names: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>("name"))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        // Composite unique indexes are not representable per-column.
        if let [single] = names.as_slice() {
            columns.push(single.clone());
        }
    }
    Ok(columns)
}

/// Counts the rows in a table.
pub fn table_row_count(conn: &Connection, table: &str) -> Result<usize, SchemaError> {
    let table = checked_identifier(table)?;
    if !table_exists(conn, table)? {
        return Err(SchemaError::TableMissing(table.to_string()));
    }
    let mut stmt = conn.prepare(&format!("SELECT COUNT(*) FROM {table}"))?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_migrate_core::ValidationError;

    fn user_channels_schema() -> TableSchema {
        TableSchema::new("user_channels")
            .with_column(ColumnSpec::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnSpec::new("user_id", ColumnType::Text).unique())
            .with_column(ColumnSpec::new("channel_id", ColumnType::Text))
            .with_column(ColumnSpec::new("last_race_time", ColumnType::Text))
            .with_column(ColumnSpec::new("display_name", ColumnType::Text))
    }

    #[test]
    fn test_generate_create_sql() {
        let sql = generate_create_sql(&user_channels_schema()).unwrap();
        assert!(sql.contains("CREATE TABLE user_channels"));
        assert!(sql.contains("id INTEGER PRIMARY KEY"));
        assert!(sql.contains("user_id TEXT UNIQUE"));
        assert!(sql.contains("display_name TEXT"));
    }

    #[test]
    fn test_generate_create_sql_rejects_malformed() {
        let schema = TableSchema::new("t")
            .with_column(ColumnSpec::new("a", ColumnType::Text).primary_key())
            .with_column(ColumnSpec::new("a", ColumnType::Text));
        assert!(matches!(
            generate_create_sql(&schema),
            Err(SchemaError::Invalid(ValidationError::DuplicateColumn(_)))
        ));
    }

    #[test]
    fn test_generate_create_sql_requires_primary_key() {
        let schema = TableSchema::new("t").with_column(ColumnSpec::new("a", ColumnType::Text));
        assert!(matches!(
            generate_create_sql(&schema),
            Err(SchemaError::Invalid(ValidationError::MissingPrimaryKey))
        ));
    }

    #[test]
    fn test_generate_drop_sql() {
        assert_eq!(
            generate_drop_sql("user_channels", false).unwrap(),
            "DROP TABLE user_channels"
        );
        assert_eq!(
            generate_drop_sql("user_channels", true).unwrap(),
            "DROP TABLE IF EXISTS user_channels"
        );
        assert!(matches!(
            generate_drop_sql("bad name", false),
            Err(SchemaError::InvalidTableName(_))
        ));
    }

    #[test]
    fn test_created_table_round_trips_through_introspection() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = user_channels_schema();
        conn.execute(&generate_create_sql(&schema).unwrap(), [])
            .unwrap();

        let recovered = table_schema(&conn, "user_channels").unwrap();
        assert_eq!(recovered, schema);
    }

    #[test]
    fn test_table_schema_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            table_schema(&conn, "nope"),
            Err(SchemaError::TableMissing(_))
        ));
    }

    #[test]
    fn test_declared_type_mapping() {
        assert_eq!(column_type_from_declared("INTEGER"), ColumnType::Integer);
        assert_eq!(column_type_from_declared("int"), ColumnType::Integer);
        assert_eq!(column_type_from_declared("VARCHAR(40)"), ColumnType::Text);
        assert_eq!(column_type_from_declared("TEXT"), ColumnType::Text);
        assert_eq!(column_type_from_declared("BLOB"), ColumnType::Blob);
        assert_eq!(column_type_from_declared("DOUBLE"), ColumnType::Real);
        assert_eq!(column_type_from_declared(""), ColumnType::Any);
        assert_eq!(column_type_from_declared("NUMERIC"), ColumnType::Any);
    }

    #[test]
    fn test_table_row_count() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT);
             INSERT INTO t (v) VALUES ('a'), ('b'), ('c');",
        )
        .unwrap();
        assert_eq!(table_row_count(&conn, "t").unwrap(), 3);
    }
}
