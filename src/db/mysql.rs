//! MySQL gateway implementation.
//!
//! Each call opens a single `MySqlConnection` from the form fields, runs its
//! work, and closes the connection before the result is returned.

use crate::config::Configuration;
use crate::db::{
    classify_statement, Column, DatabaseGateway, ForeignKey, QueryResult, Row, RowSet, Schema,
    StatementKind, Table, Value,
};
use crate::error::{Result, SqlFlowError};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column as SqlxColumn, Connection, Executor, Row as SqlxRow, TypeInfo};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// MySQL gateway. Holds no connection state.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlGateway;

impl MySqlGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseGateway for MySqlGateway {
    async fn execute(&self, config: &Configuration, statement: &str) -> Result<QueryResult> {
        let mut conn = connect(config).await?;
        let result = run_statement(&mut conn, statement).await;
        close(conn).await;
        result
    }

    async fn check_connection(&self, config: &Configuration) -> Result<()> {
        let mut conn = connect(config).await?;
        let result = conn
            .ping()
            .await
            .map_err(|e| map_connection_error(e, config));
        close(conn).await;
        result
    }

    async fn introspect_schema(&self, config: &Configuration) -> Result<Schema> {
        let mut conn = connect(config).await?;
        let result = fetch_schema(&mut conn).await;
        close(conn).await;
        result
    }
}

/// Builds connect options from the form fields.
fn connect_options(config: &Configuration) -> Result<MySqlConnectOptions> {
    let mut options = MySqlConnectOptions::new()
        .host(config.host.trim())
        .port(config.port_number()?)
        .username(&config.user);

    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if !config.database.trim().is_empty() {
        options = options.database(config.database.trim());
    }

    Ok(options)
}

async fn connect(config: &Configuration) -> Result<MySqlConnection> {
    let options = connect_options(config)?;
    debug!("Opening MySQL connection to {}", config.display_string());
    MySqlConnection::connect_with(&options)
        .await
        .map_err(|e| map_connection_error(e, config))
}

async fn close(conn: MySqlConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close MySQL connection cleanly: {e}");
    }
}

/// Runs one statement on an open connection.
///
/// Statements are sent as plain text (no binds), so they are not prepared
/// and every value arrives in the text protocol.
async fn run_statement(conn: &mut MySqlConnection, statement: &str) -> Result<QueryResult> {
    match classify_statement(statement) {
        StatementKind::ReadLike => {
            let rows: Vec<MySqlRow> = (&mut *conn)
                .fetch_all(statement)
                .await
                .map_err(|e| SqlFlowError::query(driver_message(&e)))?;

            let columns = match rows.first() {
                Some(first) => column_names(first),
                None => describe_columns(conn, statement).await,
            };

            debug!("Read statement returned {} rows", rows.len());
            Ok(QueryResult::Rows(RowSet::with_data(
                columns,
                rows.iter().map(convert_row).collect(),
            )))
        }
        StatementKind::WriteLike => {
            let mut tx = conn
                .begin()
                .await
                .map_err(|e| SqlFlowError::query(driver_message(&e)))?;

            let done = (&mut *tx)
                .execute(statement)
                .await
                .map_err(|e| SqlFlowError::query(driver_message(&e)))?;

            tx.commit()
                .await
                .map_err(|e| SqlFlowError::query(driver_message(&e)))?;

            debug!("Write statement affected {} rows", done.rows_affected());
            Ok(QueryResult::Affected {
                rows_affected: done.rows_affected(),
            })
        }
    }
}

fn column_names(row: &MySqlRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Recovers column names for a result with no rows.
async fn describe_columns(conn: &mut MySqlConnection, statement: &str) -> Vec<String> {
    match (&mut *conn).describe(statement).await {
        Ok(described) => described
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        Err(e) => {
            debug!("Could not describe empty result: {e}");
            Vec::new()
        }
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value using the server-reported type name.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let upper = type_name.to_uppercase();

    let typed = match upper.as_str() {
        "NULL" => return Value::Null,

        "BOOLEAN" => row.try_get::<Option<bool>, _>(index).ok().map(Value::from),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            row.try_get::<Option<i64>, _>(index).ok().map(Value::from)
        }

        t if t.ends_with("UNSIGNED") => row.try_get::<Option<u64>, _>(index).ok().map(Value::from),

        "FLOAT" | "DOUBLE" => row.try_get::<Option<f64>, _>(index).ok().map(Value::from),

        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .map(Value::from),

        _ => row.try_get::<Option<String>, _>(index).ok().map(Value::from),
    };

    // Text protocol values always decode as UTF-8, whatever the column type.
    typed.unwrap_or_else(|| {
        row.try_get_unchecked::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null)
    })
}

async fn fetch_schema(conn: &mut MySqlConnection) -> Result<Schema> {
    let column_rows: Vec<(String, String, String, String, Option<String>)> = sqlx::query_as(
        r#"
        SELECT
            CAST(c.table_name AS CHAR),
            CAST(c.column_name AS CHAR),
            CAST(c.column_type AS CHAR),
            CAST(c.is_nullable AS CHAR),
            CAST(c.column_default AS CHAR)
        FROM information_schema.columns c
        JOIN information_schema.tables t
            ON t.table_schema = c.table_schema AND t.table_name = c.table_name
        WHERE c.table_schema = DATABASE() AND t.table_type = 'BASE TABLE'
        ORDER BY c.table_name, c.ordinal_position
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| SqlFlowError::query(format!("Failed to fetch columns: {e}")))?;

    let mut tables: BTreeMap<String, Table> = BTreeMap::new();
    for (table_name, name, data_type, is_nullable, default) in column_rows {
        tables
            .entry(table_name.clone())
            .or_insert_with(|| Table::new(table_name))
            .columns
            .push(Column {
                name,
                data_type,
                is_nullable: is_nullable == "YES",
                default,
            });
    }

    let key_rows: Vec<(String, String, String, Option<String>, Option<String>)> = sqlx::query_as(
        r#"
        SELECT
            CAST(constraint_name AS CHAR),
            CAST(table_name AS CHAR),
            CAST(column_name AS CHAR),
            CAST(referenced_table_name AS CHAR),
            CAST(referenced_column_name AS CHAR)
        FROM information_schema.key_column_usage
        WHERE table_schema = DATABASE()
            AND (constraint_name = 'PRIMARY' OR referenced_table_name IS NOT NULL)
        ORDER BY table_name, constraint_name, ordinal_position
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| SqlFlowError::query(format!("Failed to fetch keys: {e}")))?;

    // Multi-column foreign keys share a constraint name.
    let mut fk_map: BTreeMap<(String, String), ForeignKey> = BTreeMap::new();
    for (constraint, table_name, column, ref_table, ref_column) in key_rows {
        match (ref_table, ref_column) {
            (Some(ref_table), Some(ref_column)) => {
                let fk = fk_map
                    .entry((table_name.clone(), constraint))
                    .or_insert_with(|| ForeignKey::new(table_name, vec![], ref_table, vec![]));
                fk.from_columns.push(column);
                fk.to_columns.push(ref_column);
            }
            _ => {
                if let Some(table) = tables.get_mut(&table_name) {
                    table.primary_key.push(column);
                }
            }
        }
    }

    Ok(Schema {
        tables: tables.into_values().collect(),
        foreign_keys: fk_map.into_values().collect(),
    })
}

/// Returns the driver's own message for database errors, otherwise the
/// sqlx rendering.
fn driver_message(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}

/// Maps sqlx connection errors to user-facing messages.
fn map_connection_error(error: sqlx::Error, config: &Configuration) -> SqlFlowError {
    let host = &config.host;
    let port = &config.port;
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        SqlFlowError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("access denied") {
        SqlFlowError::connection(format!(
            "Access denied for user '{}'. Check your credentials.",
            config.user
        ))
    } else if error_str.contains("unknown database") {
        SqlFlowError::connection(format!("Database '{}' does not exist.", config.database))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        SqlFlowError::connection(format!("Connection to {host}:{port} timed out."))
    } else {
        SqlFlowError::connection(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests need a running MySQL server and skip unless DATABASE_URL is set.

    fn test_config() -> Option<Configuration> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let config = Configuration::from_connection_string(&url).ok()?;
        (config.backend == crate::db::DatabaseBackend::MySql).then_some(config)
    }

    #[test]
    fn test_connect_options_reject_bad_port() {
        let config = Configuration {
            port: "33o6".to_string(),
            ..Default::default()
        };
        let err = connect_options(&config).unwrap_err();
        assert!(matches!(err, SqlFlowError::Connection(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_error() {
        let config = Configuration {
            host: "127.0.0.1".to_string(),
            port: "1".to_string(),
            ..Default::default()
        };
        let err = MySqlGateway::new()
            .check_connection(&config)
            .await
            .unwrap_err();
        assert!(matches!(err, SqlFlowError::Connection(_)));
    }

    #[tokio::test]
    async fn test_select_literal() {
        let Some(config) = test_config() else {
            eprintln!("Skipping test: DATABASE_URL not set");
            return;
        };

        let result = MySqlGateway::new()
            .execute(&config, "SELECT 1 AS num, 'hello' AS greeting")
            .await
            .unwrap();

        let rows = result.rows().unwrap();
        assert_eq!(rows.columns, vec!["num", "greeting"]);
        assert_eq!(rows.get(0, "num"), Some(&Value::Int(1)));
        assert_eq!(rows.get(0, "greeting"), Some(&Value::from("hello")));
    }

    #[tokio::test]
    async fn test_unknown_table_carries_driver_message() {
        let Some(config) = test_config() else {
            eprintln!("Skipping test: DATABASE_URL not set");
            return;
        };

        let err = MySqlGateway::new()
            .execute(&config, "SELECT * FROM nonexistent_table_xyz")
            .await
            .unwrap_err();

        assert!(matches!(err, SqlFlowError::Query(_)));
        assert!(err.message().contains("nonexistent_table_xyz"));
    }
}
