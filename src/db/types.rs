//! Query result types for SQLFlow.
//!
//! A statement yields either a materialized row set or an affected-row count.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of executing a single statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryResult {
    /// Rows returned by a read-like statement.
    Rows(RowSet),
    /// Count returned by a write-like statement after commit.
    Affected { rows_affected: u64 },
}

impl QueryResult {
    /// Returns the row set, if this is a read result.
    pub fn rows(&self) -> Option<&RowSet> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Affected { .. } => None,
        }
    }

    /// Returns the affected-row count, if this is a write result.
    pub fn rows_affected(&self) -> Option<u64> {
        match self {
            Self::Rows(_) => None,
            Self::Affected { rows_affected } => Some(*rows_affected),
        }
    }
}

/// A fully materialized result set.
///
/// Rows are stored positionally; each row maps `columns[i]` to `row[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    /// Column names, in result order.
    pub columns: Vec<String>,

    /// Rows of data.
    pub rows: Vec<Row>,
}

impl RowSet {
    /// Creates an empty row set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row set with the given columns and rows.
    pub fn with_data(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Returns true if no rows were returned.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns row `index` as field-name/value pairs.
    pub fn record(&self, index: usize) -> Option<Vec<(&str, &Value)>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter())
                .collect(),
        )
    }

    /// Looks up a single field by column name.
    pub fn get(&self, index: usize, column: &str) -> Option<&Value> {
        let position = self.columns.iter().position(|c| c == column)?;
        self.rows.get(index)?.get(position)
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// A single scalar value from a database query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integer (MySQL `BIGINT UNSIGNED` and friends).
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts the value to its display representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}
