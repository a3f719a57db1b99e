//! OpenAI LLM client implementation.
//!
//! Sends the prompt as a single user message to the chat completions API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SqlFlowError};
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// OpenAI API base URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI client configuration.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl OpenAiConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SqlFlowError::llm(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn build_request(&self, prompt: &str) -> OpenAiRequest {
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        }
    }

    /// Maps a non-success API response to an error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> SqlFlowError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return SqlFlowError::llm("Authentication failed. Check your OpenAI API key.");
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return SqlFlowError::llm("Rate limited by OpenAI.");
        }

        match serde_json::from_str::<OpenAiErrorResponse>(body) {
            Ok(error_response) => SqlFlowError::llm(format!(
                "OpenAI API error: {}",
                error_response.error.message
            )),
            Err(_) => SqlFlowError::llm(format!("OpenAI API error ({status}): {body}")),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt);
        debug!("OpenAI request to model {}", self.config.model);

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SqlFlowError::llm("Request to OpenAI timed out.")
                } else if e.is_connect() {
                    SqlFlowError::llm("Failed to connect to OpenAI API. Check your network.")
                } else {
                    SqlFlowError::llm(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SqlFlowError::llm(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let response: OpenAiResponse = serde_json::from_str(&body)
            .map_err(|e| SqlFlowError::llm(format!("Failed to parse response: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SqlFlowError::llm("No response from OpenAI"))
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiReply,
}

#[derive(Debug, Deserialize)]
struct OpenAiReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}
