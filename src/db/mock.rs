//! Mock database gateway for testing.
//!
//! Returns scripted results in order and records every statement it sees.

use super::{DatabaseGateway, QueryResult, RowSet, Schema};
use crate::config::Configuration;
use crate::error::{Result, SqlFlowError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A scripted gateway.
///
/// Each `execute` call pops the next queued outcome. With nothing queued it
/// returns an empty row set. Clones share the queue and the statement log.
#[derive(Default, Clone)]
pub struct MockDatabaseGateway {
    schema: Schema,
    outcomes: Arc<Mutex<VecDeque<std::result::Result<QueryResult, String>>>>,
    executed: Arc<Mutex<Vec<String>>>,
    connect_error: Option<String>,
}

impl MockDatabaseGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given schema for `introspect_schema`.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Queues a successful result.
    pub fn with_result(self, result: QueryResult) -> Self {
        self.push(Ok(result));
        self
    }

    /// Queues a statement failure carrying the given driver message.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    /// Makes every call fail as if the server were unreachable.
    pub fn unreachable(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    /// Returns the statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|executed| executed.clone())
            .unwrap_or_default()
    }

    fn push(&self, outcome: std::result::Result<QueryResult, String>) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(outcome);
        }
    }

    fn check_reachable(&self) -> Result<()> {
        match &self.connect_error {
            Some(message) => Err(SqlFlowError::connection(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DatabaseGateway for MockDatabaseGateway {
    async fn execute(&self, _config: &Configuration, statement: &str) -> Result<QueryResult> {
        self.check_reachable()?;

        if let Ok(mut executed) = self.executed.lock() {
            executed.push(statement.to_string());
        }

        let next = self
            .outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front());

        match next {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(SqlFlowError::query(message)),
            None => Ok(QueryResult::Rows(RowSet::new())),
        }
    }

    async fn check_connection(&self, _config: &Configuration) -> Result<()> {
        self.check_reachable()
    }

    async fn introspect_schema(&self, _config: &Configuration) -> Result<Schema> {
        self.check_reachable()?;
        Ok(self.schema.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_outcomes_in_order() {
        let config = Configuration::default();
        let gateway = MockDatabaseGateway::new()
            .with_result(QueryResult::Affected { rows_affected: 1 })
            .with_error("Unknown column 'x' in 'field list'");

        let first = gateway.execute(&config, "INSERT 1").await.unwrap();
        assert_eq!(first.rows_affected(), Some(1));

        let second = gateway.execute(&config, "SELECT x").await.unwrap_err();
        assert_eq!(second.message(), "Unknown column 'x' in 'field list'");

        let third = gateway.execute(&config, "SELECT 1").await.unwrap();
        assert!(third.rows().unwrap().is_empty());

        assert_eq!(gateway.executed(), vec!["INSERT 1", "SELECT x", "SELECT 1"]);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let config = Configuration::default();
        let gateway = MockDatabaseGateway::new().unreachable("refused");

        let err = gateway.check_connection(&config).await.unwrap_err();
        assert!(matches!(err, SqlFlowError::Connection(_)));
        assert!(gateway.execute(&config, "SELECT 1").await.is_err());
        assert!(gateway.executed().is_empty());
    }
}
