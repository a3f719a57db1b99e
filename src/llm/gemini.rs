//! Google Gemini client implementation.
//!
//! Uses the `generateContent` endpoint with a single text part.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SqlFlowError};
use crate::llm::LlmClient;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Gemini LLM client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SqlFlowError::llm(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_API_BASE}/{}:generateContent", self.config.model)
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{"parts": [{"text": prompt}]}]
        })
    }

    /// Extracts the first candidate's text.
    fn parse_response(body: &Value) -> Result<String> {
        if let Some(text) = body
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
        {
            return Ok(text.trim().to_string());
        }

        match body
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
        {
            Some(reason) => Err(SqlFlowError::llm(format!(
                "Gemini blocked the prompt ({reason})"
            ))),
            None => Err(SqlFlowError::llm(
                "Gemini response had no candidates[0].content.parts[0].text",
            )),
        }
    }

    fn parse_error(status: reqwest::StatusCode, body: &str) -> SqlFlowError {
        match serde_json::from_str::<GeminiErrorResponse>(body) {
            Ok(error_response) => {
                SqlFlowError::llm(format!("Gemini API error: {}", error_response.error.message))
            }
            Err(_) => SqlFlowError::llm(format!("Gemini API error ({status}): {body}")),
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Gemini request to model {}", self.config.model);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                // reqwest includes the URL in its message, and the URL holds the key.
                let e = e.without_url();
                if e.is_timeout() {
                    SqlFlowError::llm("Request to Gemini timed out.")
                } else if e.is_connect() {
                    SqlFlowError::llm("Failed to connect to Gemini API. Check your network.")
                } else {
                    SqlFlowError::llm(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SqlFlowError::llm(format!("Failed to read response: {}", e.without_url())))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| SqlFlowError::llm(format!("Failed to parse response: {e}")))?;

        Self::parse_response(&json)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
