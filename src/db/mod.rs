//! Database gateway for SQLFlow.
//!
//! Every gateway call opens its own connection from the session configuration
//! and closes it before returning. Nothing is pooled between calls.

mod mock;
mod mysql;
mod schema;
mod sqlite;
mod types;

pub use mock::MockDatabaseGateway;
pub use mysql::MySqlGateway;
pub use schema::{Column, ForeignKey, Schema, Table};
pub use sqlite::SqliteGateway;
pub use types::{QueryResult, Row, RowSet, Value};

use crate::config::Configuration;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    MySql,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend name as used in config files and CLI flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

impl std::fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a statement is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Rows are fetched and returned.
    ReadLike,
    /// Executed in a committed transaction; the affected count is returned.
    WriteLike,
}

const READ_PREFIXES: [&str; 4] = ["select", "show", "describe", "explain"];

/// Classifies a statement by its leading keyword.
///
/// This is a plain prefix test on the trimmed, lower-cased text, so
/// `selectfoo` counts as read-like and a leading comment or CTE does not.
pub fn classify_statement(statement: &str) -> StatementKind {
    let normalized = statement.trim().to_lowercase();
    if READ_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        StatementKind::ReadLike
    } else {
        StatementKind::WriteLike
    }
}

/// Creates the gateway for the given backend.
pub fn gateway_for(backend: DatabaseBackend) -> Box<dyn DatabaseGateway> {
    match backend {
        DatabaseBackend::MySql => Box::new(MySqlGateway::new()),
        DatabaseBackend::Sqlite => Box::new(SqliteGateway::new()),
    }
}

/// Interface to the target database.
///
/// Implementations are stateless with respect to connections: each method
/// connects with `config`, does its work, and disconnects.
#[async_trait]
pub trait DatabaseGateway: Send + Sync {
    /// Executes one statement and returns rows or an affected-row count.
    async fn execute(&self, config: &Configuration, statement: &str) -> Result<QueryResult>;

    /// Opens and closes a connection to verify the configuration.
    async fn check_connection(&self, config: &Configuration) -> Result<()>;

    /// Introspects the tables of the configured database.
    async fn introspect_schema(&self, config: &Configuration) -> Result<Schema>;

    /// Returns the schema as prompt text.
    async fn table_info(&self, config: &Configuration) -> Result<String> {
        let schema = self.introspect_schema(config).await?;
        Ok(schema.format_for_llm())
    }
}
