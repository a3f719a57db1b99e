//! Gateway tests against real SQLite files.

use pretty_assertions::assert_eq;
use sqlflow::config::Configuration;
use sqlflow::db::{gateway_for, DatabaseBackend, DatabaseGateway, QueryResult, SqliteGateway, Value};
use tempfile::NamedTempFile;

fn sqlite_config(file: &NamedTempFile) -> Configuration {
    Configuration {
        backend: DatabaseBackend::Sqlite,
        database: file.path().to_string_lossy().into_owned(),
        ..Default::default()
    }
}

async fn with_table(ddl: &str) -> (NamedTempFile, Configuration) {
    let file = NamedTempFile::new().unwrap();
    let config = sqlite_config(&file);
    SqliteGateway::new().execute(&config, ddl).await.unwrap();
    (file, config)
}

#[tokio::test]
async fn test_read_like_statements_return_rows_in_any_case() {
    let (_file, config) = with_table("CREATE TABLE t (a INTEGER)").await;
    let gateway = SqliteGateway::new();

    for statement in ["SELECT * FROM t", "select a from t", "  Select 1", "EXPLAIN SELECT * FROM t"] {
        let result = gateway.execute(&config, statement).await.unwrap();
        assert!(
            matches!(result, QueryResult::Rows(_)),
            "{statement} should return rows"
        );
    }
}

#[tokio::test]
async fn test_insert_reports_affected_rows() {
    let (_file, config) = with_table("CREATE TABLE t (a INTEGER)").await;
    let gateway = SqliteGateway::new();

    let result = gateway
        .execute(&config, "INSERT INTO t (a) VALUES (1)")
        .await
        .unwrap();
    assert_eq!(result, QueryResult::Affected { rows_affected: 1 });

    // The write was committed and is visible to a fresh connection.
    let rows = gateway.execute(&config, "SELECT a FROM t").await.unwrap();
    let rows = rows.rows().unwrap();
    assert_eq!(rows.get(0, "a"), Some(&Value::Int(1)));
}

#[tokio::test]
async fn test_empty_table_returns_empty_row_set_with_columns() {
    let (_file, config) = with_table("CREATE TABLE t (a INTEGER, b TEXT)").await;

    let result = SqliteGateway::new()
        .execute(&config, "SELECT * FROM t")
        .await
        .unwrap();

    let rows = result.rows().unwrap();
    assert!(rows.is_empty());
    assert_eq!(rows.columns, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_update_and_delete_are_write_like() {
    let (_file, config) = with_table("CREATE TABLE t (a INTEGER)").await;
    let gateway = SqliteGateway::new();
    gateway
        .execute(&config, "INSERT INTO t (a) VALUES (1), (2), (3)")
        .await
        .unwrap();

    let updated = gateway
        .execute(&config, "UPDATE t SET a = a + 10 WHERE a > 1")
        .await
        .unwrap();
    assert_eq!(updated.rows_affected(), Some(2));

    let deleted = gateway.execute(&config, "DELETE FROM t").await.unwrap();
    assert_eq!(deleted.rows_affected(), Some(3));
}

#[tokio::test]
async fn test_factory_gateway_describes_schema() {
    let (_file, config) = with_table(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL)",
    )
    .await;

    let gateway = gateway_for(DatabaseBackend::Sqlite);
    gateway.check_connection(&config).await.unwrap();
    let info = gateway.table_info(&config).await.unwrap();

    assert!(info.contains("CREATE TABLE users"));
    assert!(info.contains("email TEXT NOT NULL"));
    assert!(info.contains("PRIMARY KEY (id)"));
}
