//! OpenAI-compatible chat client.
//!
//! Uses `async-openai` for the chat completions call. A custom base URL
//! points the client at any OpenAI-compatible endpoint. The client makes
//! exactly one attempt per call; the search loop owns the retry policy.

use serde_json::json;

use crate::errors::{LlmError, Result, SearchError};

use super::{LlmClient, Message};

/// OpenAI-compatible chat client implementing [`LlmClient`].
pub struct OpenAiClient {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_key` – API key (any non-empty value for local backends).
    /// * `model`   – Model name (e.g. `"gpt-4o-mini"`, `"llama3.2:3b"`).
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        Self::with_config(config, model)
    }

    /// Create a new client pointing at a custom API base URL.
    pub fn with_api_base(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url.into());
        Self::with_config(config, model)
    }

    fn with_config(config: async_openai::config::OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: async_openai::Client::with_config(config),
            model: model.into(),
            temperature: 1.0,
            max_tokens: 256,
        }
    }

    /// Override the sampling temperature. The default of `1.0` keeps the
    /// guidance step from proposing the same guess over and over.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the max output token limit (default `256`).
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Extract the assistant message text from a chat-completions response.
    fn extract_content(response: &serde_json::Value) -> Result<String> {
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(ToOwned::to_owned)
            .ok_or(SearchError::Llm(LlmError::EmptyResponse))
    }
}

impl LlmClient for OpenAiClient {
    async fn generate(&self, messages: &[Message]) -> Result<String> {
        let request = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let outcome: std::result::Result<serde_json::Value, async_openai::error::OpenAIError> =
            self.client.chat().create_byot(request).await;

        let response = outcome.map_err(|e| SearchError::Llm(map_openai_error(e)))?;
        Self::extract_content(&response)
    }
}

/// Map an [`async_openai::error::OpenAIError`] to our [`LlmError`] domain type.
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match err {
        OpenAIError::ApiError(api_err) => {
            // async-openai 0.28 does not surface the HTTP status code on
            // `ApiError`; classify using the error `code`/`type` it returns
            // instead (the same discriminators OpenAI sends alongside the
            // 401/403/429 statuses).
            let code = api_err.code.as_deref().unwrap_or("");
            let kind = api_err.r#type.as_deref().unwrap_or("");
            match (code, kind) {
                ("invalid_api_key", _)
                | ("invalid_authentication", _)
                | (_, "authentication_error") => LlmError::Authentication,
                ("rate_limit_exceeded", _) | (_, "rate_limit_error") => LlmError::RateLimit,
                _ => LlmError::Api {
                    status: 0,
                    message: api_err.message,
                },
            }
        }
        other => LlmError::Api {
            status: 0,
            message: other.to_string(),
        },
    }
}
