//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns and records every
//! prompt it receives.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{Result, SqlFlowError};
use crate::llm::LlmClient;

/// Marker that only appears in the error-explanation prompt.
const EXPLANATION_MARKER: &str = "the following query failed";

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Patterns are matched case-insensitively against the user request of a
/// SQL prompt, or against the whole prompt for error explanations. Clones
/// share the prompt log.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// One-shot failures (pattern -> error message), removed once they fire.
    failures: Arc<Mutex<Vec<(String, String)>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the input contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Makes the next call whose input contains `pattern` fail with an LLM error.
    pub fn with_failure(self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((pattern.into(), message.into()));
        }
        self
    }

    fn take_failure(&self, input: &str) -> Option<String> {
        let mut failures = self.failures.lock().ok()?;
        let index = failures
            .iter()
            .position(|(pattern, _)| input.contains(&pattern.to_lowercase()))?;
        Some(failures.remove(index).1)
    }

    /// Returns every prompt received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    /// Picks the text patterns are matched against.
    fn match_input(prompt: &str) -> String {
        let lower = prompt.to_lowercase();
        if lower.contains(EXPLANATION_MARKER) {
            return lower;
        }

        // Only the current question, so earlier history lines do not match.
        match lower.rfind("user request:") {
            Some(start) => {
                let request = &lower[start + "user request:".len()..];
                request
                    .split("sql query:")
                    .next()
                    .unwrap_or(request)
                    .trim()
                    .to_string()
            }
            None => lower,
        }
    }

    /// Generates a mock response based on the input.
    fn mock_response(&self, input: &str) -> Result<String> {
        if let Some(message) = self.take_failure(input) {
            return Err(SqlFlowError::llm(message));
        }

        for (pattern, response) in &self.custom_responses {
            if input.contains(&pattern.to_lowercase()) {
                return Ok(response.clone());
            }
        }

        if input.contains(EXPLANATION_MARKER) {
            return Ok(
                "The query references a table or column that does not exist. Check the schema."
                    .to_string(),
            );
        }

        let sql = if input.contains("all users") || input.contains("show users") {
            "```sql\nSELECT * FROM users;\n```"
        } else if input.contains("count") && input.contains("orders") {
            "```sql\nSELECT COUNT(*) FROM orders;\n```"
        } else if input.contains("random data") || input.contains("sample rows") {
            "```sql\nINSERT INTO users (email, name) VALUES ('ada@example.com', 'Ada Lovelace');\n```"
        } else if input.contains("tables") {
            "SHOW TABLES;"
        } else {
            "SELECT 1;"
        };

        Ok(sql.to_string())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.mock_response(&Self::match_input(prompt))
    }
}
