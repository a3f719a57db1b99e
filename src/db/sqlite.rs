//! SQLite gateway implementation.
//!
//! The database field of the configuration holds the file path. Network
//! fields are ignored. The file must already exist.
//!
//! Writes run inside a transaction, except statements SQLite refuses there
//! (`VACUUM`, `PRAGMA`, `ATTACH`, `DETACH`), which run in autocommit mode.

use crate::config::Configuration;
use crate::db::{
    classify_statement, Column, DatabaseGateway, ForeignKey, QueryResult, Row, RowSet, Schema,
    StatementKind, Table, Value,
};
use crate::error::{Result, SqlFlowError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column as SqlxColumn, Connection, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use tracing::{debug, warn};

/// SQLite gateway. Holds no connection state.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteGateway;

impl SqliteGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseGateway for SqliteGateway {
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
            .map_err(|e| SqlFlowError::connection(e.to_string()));
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

async fn connect(config: &Configuration) -> Result<SqliteConnection> {
    let path = config.database.trim();
    if path.is_empty() {
        return Err(SqlFlowError::connection(
            "No database file configured for SQLite.",
        ));
    }

    debug!("Opening SQLite database {path}");
    let options = SqliteConnectOptions::new().filename(path);
    SqliteConnection::connect_with(&options)
        .await
        .map_err(|e| SqlFlowError::connection(format!("Cannot open '{path}': {e}")))
}

async fn close(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close SQLite connection cleanly: {e}");
    }
}

async fn run_statement(conn: &mut SqliteConnection, statement: &str) -> Result<QueryResult> {
    match classify_statement(statement) {
        StatementKind::ReadLike => {
            let rows: Vec<SqliteRow> = (&mut *conn)
                .fetch_all(statement)
                .await
                .map_err(|e| SqlFlowError::query(driver_message(&e)))?;

            let columns = match rows.first() {
                Some(first) => first
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect(),
                None => describe_columns(conn, statement).await,
            };

            Ok(QueryResult::Rows(RowSet::with_data(
                columns,
                rows.iter().map(convert_row).collect(),
            )))
        }
        StatementKind::WriteLike if runs_outside_transaction(statement) => {
            let done = (&mut *conn)
                .execute(statement)
                .await
                .map_err(|e| SqlFlowError::query(driver_message(&e)))?;

            Ok(QueryResult::Affected {
                rows_affected: done.rows_affected(),
            })
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

            Ok(QueryResult::Affected {
                rows_affected: done.rows_affected(),
            })
        }
    }
}

/// Statements SQLite rejects inside a transaction.
fn runs_outside_transaction(statement: &str) -> bool {
    const AUTOCOMMIT_ONLY: [&str; 4] = ["vacuum", "pragma", "attach", "detach"];

    let keyword = statement
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    AUTOCOMMIT_ONLY
        .iter()
        .any(|candidate| keyword.eq_ignore_ascii_case(candidate))
}

async fn describe_columns(conn: &mut SqliteConnection, statement: &str) -> Vec<String> {
    (&mut *conn)
        .describe(statement)
        .await
        .map(|described| {
            described
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| match row.try_get_raw(i) {
            Ok(raw) if !raw.is_null() => {
                let type_name = raw.type_info().name().to_string();
                convert_value(row, i, &type_name)
            }
            _ => Value::Null,
        })
        .collect()
}

/// Converts a single value. SQLite types are per-value, so `type_name` is
/// the storage class of this particular cell, not the declared column type.
fn convert_value(row: &SqliteRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "NULL" => Value::Null,
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "INTEGER" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),
        "REAL" | "NUMERIC" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => row
            .try_get_unchecked::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

async fn fetch_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    let table_names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| SqlFlowError::query(format!("Failed to fetch tables: {e}")))?;

    let mut schema = Schema::new();

    for table_name in table_names {
        let columns: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid"#,
        )
        .bind(&table_name)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            SqlFlowError::query(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        let mut primary_key: Vec<(i64, String)> = columns
            .iter()
            .filter(|(_, _, _, _, pk)| *pk > 0)
            .map(|(name, _, _, _, pk)| (*pk, name.clone()))
            .collect();
        primary_key.sort();

        let foreign_keys: Vec<(i64, String, String, Option<String>)> = sqlx::query_as(
            r#"SELECT id, "table", "from", "to" FROM pragma_foreign_key_list(?1) ORDER BY id, seq"#,
        )
        .bind(&table_name)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            SqlFlowError::query(format!("Failed to fetch foreign keys for {table_name}: {e}"))
        })?;

        let mut current: Option<(i64, ForeignKey)> = None;
        for (id, to_table, from, to) in foreign_keys {
            match current.as_mut() {
                Some((current_id, fk)) if *current_id == id => {
                    fk.from_columns.push(from);
                    fk.to_columns.extend(to);
                }
                _ => {
                    if let Some((_, fk)) = current.take() {
                        schema.foreign_keys.push(fk);
                    }
                    let fk = ForeignKey::new(
                        table_name.clone(),
                        vec![from],
                        to_table,
                        to.into_iter().collect(),
                    );
                    current = Some((id, fk));
                }
            }
        }
        if let Some((_, fk)) = current {
            schema.foreign_keys.push(fk);
        }

        schema.tables.push(Table {
            name: table_name,
            columns: columns
                .into_iter()
                .map(|(name, data_type, not_null, default, _)| Column {
                    name,
                    data_type,
                    is_nullable: not_null == 0,
                    default,
                })
                .collect(),
            primary_key: primary_key.into_iter().map(|(_, name)| name).collect(),
        });
    }

    Ok(schema)
}

fn driver_message(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
