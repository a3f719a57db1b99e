//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::error::{Result, SqlFlowError};
use crate::llm::{
    GeminiClient, GeminiConfig, LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig,
};

/// Creates an LLM client for the given provider.
///
/// The key is resolved from `api_key` first, then from the provider's
/// environment variables (`GEMINI_API_KEY` or `GOOGLE_API_KEY`, and
/// `OPENAI_API_KEY`). Blank keys count as missing. `model` falls back to
/// [`LlmProvider::default_model`].
pub fn create_client(
    provider: LlmProvider,
    api_key: Option<String>,
    model: Option<String>,
) -> Result<Box<dyn LlmClient>> {
    let model = model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| provider.default_model().to_string());

    match provider {
        LlmProvider::Gemini => {
            let key = resolve_key(api_key, key_env_vars(provider))?;
            Ok(Box::new(GeminiClient::new(GeminiConfig::new(key, model))?))
        }
        LlmProvider::OpenAi => {
            let key = resolve_key(api_key, key_env_vars(provider))?;
            Ok(Box::new(OpenAiClient::new(OpenAiConfig::new(key, model))?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

/// Returns the environment variables consulted for a provider's key.
pub fn key_env_vars(provider: LlmProvider) -> &'static [&'static str] {
    match provider {
        LlmProvider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        LlmProvider::OpenAi => &["OPENAI_API_KEY"],
        LlmProvider::Mock => &[],
    }
}

/// Looks up the provider's key in the environment, skipping blank values.
pub fn key_from_env(provider: LlmProvider) -> Option<String> {
    key_env_vars(provider)
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
}

fn resolve_key(api_key: Option<String>, vars: &[&str]) -> Result<String> {
    api_key
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .or_else(|| {
            vars.iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|value| !value.trim().is_empty())
        })
        .ok_or_else(|| {
            SqlFlowError::llm(format!(
                "No API key configured. Enter one in the sidebar or set {}.",
                vars.join(" or ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_client() {
        let client = create_client(LlmProvider::Mock, None, None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_gemini_with_provided_key() {
        let result = create_client(LlmProvider::Gemini, Some("test-key".to_string()), None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_create_openai_with_provided_key_and_model() {
        let result = create_client(
            LlmProvider::OpenAi,
            Some("test-key".to_string()),
            Some("gpt-4o-mini".to_string()),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_key_error_names_variables() {
        let err = resolve_key(Some("   ".to_string()), &["SQLFLOW_TEST_UNSET_KEY"])
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "LLM error: No API key configured. Enter one in the sidebar or set SQLFLOW_TEST_UNSET_KEY."
        );
    }

    #[test]
    fn test_key_env_vars() {
        assert_eq!(
            key_env_vars(LlmProvider::Gemini),
            &["GEMINI_API_KEY", "GOOGLE_API_KEY"]
        );
        assert!(key_env_vars(LlmProvider::Mock).is_empty());
    }
}
