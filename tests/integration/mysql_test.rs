//! MySQL gateway integration tests.
//!
//! These tests need a running MySQL server. Set DATABASE_URL to a
//! mysql:// connection string with rights to create tables; they skip otherwise.

use pretty_assertions::assert_eq;
use sqlflow::config::Configuration;
use sqlflow::db::{DatabaseBackend, DatabaseGateway, MySqlGateway, QueryResult};
use sqlflow::error::SqlFlowError;

/// Helper to get the test configuration from the environment.
fn get_test_config() -> Option<Configuration> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = Configuration::from_connection_string(&url).ok()?;
    (config.backend == DatabaseBackend::MySql).then_some(config)
}

#[tokio::test]
async fn test_insert_and_read_back() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let gateway = MySqlGateway::new();

    gateway
        .execute(&config, "DROP TABLE IF EXISTS sqlflow_it_insert")
        .await
        .unwrap();
    gateway
        .execute(&config, "CREATE TABLE sqlflow_it_insert (a INT)")
        .await
        .unwrap();

    let inserted = gateway
        .execute(&config, "INSERT INTO sqlflow_it_insert (a) VALUES (1)")
        .await
        .unwrap();
    assert_eq!(inserted, QueryResult::Affected { rows_affected: 1 });

    let read = gateway
        .execute(&config, "select a from sqlflow_it_insert")
        .await
        .unwrap();
    assert_eq!(read.rows().unwrap().len(), 1);

    gateway
        .execute(&config, "DROP TABLE sqlflow_it_insert")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_empty_select_keeps_columns() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let gateway = MySqlGateway::new();

    gateway
        .execute(&config, "DROP TABLE IF EXISTS sqlflow_it_empty")
        .await
        .unwrap();
    gateway
        .execute(&config, "CREATE TABLE sqlflow_it_empty (a INT, b VARCHAR(10))")
        .await
        .unwrap();

    let result = gateway
        .execute(&config, "SELECT * FROM sqlflow_it_empty")
        .await
        .unwrap();
    let rows = result.rows().unwrap();
    assert!(rows.is_empty());
    assert_eq!(rows.columns, vec!["a".to_string(), "b".to_string()]);

    gateway
        .execute(&config, "DROP TABLE sqlflow_it_empty")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_column_is_query_error() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = MySqlGateway::new()
        .execute(&config, "SELECT no_such_column FROM information_schema.tables")
        .await
        .unwrap_err();
    assert!(matches!(err, SqlFlowError::Query(_)));
    assert!(err.message().contains("Unknown column"));
}

#[tokio::test]
async fn test_show_tables_and_table_info() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let gateway = MySqlGateway::new();

    gateway.check_connection(&config).await.unwrap();
    let shown = gateway.execute(&config, "SHOW TABLES").await.unwrap();
    assert!(shown.rows().is_some());

    let info = gateway.table_info(&config).await.unwrap();
    assert!(!info.is_empty());
}
