//! Error types for SQLFlow.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for SQLFlow operations.
#[derive(Error, Debug)]
pub enum SqlFlowError {
    /// Database connection errors (host unreachable, bad credentials, bad port, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution errors. Carries the driver message unchanged.
    #[error("Query error: {0}")]
    Query(String),

    /// LLM API errors (missing key, auth, transport, malformed response).
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, unknown provider, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (terminal setup, unexpected states).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SqlFlowError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the bare message without the category prefix.
    ///
    /// This is the text forwarded to the error-explanation prompt.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Llm(msg)
            | Self::Config(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias using SqlFlowError.
pub type Result<T> = std::result::Result<T, SqlFlowError>;
