//! LLM integration for SQLFlow.
//!
//! A client turns one prompt into one text completion. Prompts are built in
//! [`prompt`] and the SQL is pulled out of the reply by [`parser`].

pub mod factory;
pub mod gemini;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod prompt;

pub use factory::{create_client, key_from_env};
pub use gemini::{GeminiClient, GeminiConfig};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use parser::strip_code_fences;

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::{Result, SqlFlowError};

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends a single prompt and returns the full response text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Google Gemini
    #[default]
    Gemini,
    /// OpenAI chat completions
    OpenAi,
    /// Mock client for testing (no network)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::OpenAi => "gpt-4o",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = SqlFlowError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(SqlFlowError::config(format!("Unknown LLM provider: {s}"))),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
