//! OpenAI-compatible chat completions provider.
//!
//! Works with:
//! - `OpenAI` API
//! - LM Studio, vLLM, Ollama (with `OpenAI` compatibility)
//! - Any `OpenAI`-compatible endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::http::post_json;
use crate::provider::{LlmProvider, ProviderConfig, http_client};
use crate::types::{LlmResponse, Message, Usage, chat_messages};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    client: Client,
    model: String,
    temperature: f64,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiCompatProvider {
    /// Build from provider configuration. Without `api_url` the public
    /// `OpenAI` endpoint is used.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigError`] if the HTTP client cannot be built.
    pub fn from_config(config: &ProviderConfig) -> LlmResult<Self> {
        Ok(Self {
            client: http_client(config.request_timeout)?,
            model: config.model.clone(),
            temperature: config.temperature,
            base_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn build_request(&self, system: &str, messages: &[Message], max_tokens: u32) -> Value {
        serde_json::json!({
            "model": self.model,
            "messages": chat_messages(system, messages),
            "max_tokens": max_tokens,
            "temperature": self.temperature,
            "stream": false
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "openai-compat"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        max_tokens: u32,
    ) -> LlmResult<LlmResponse> {
        // Local endpoints (LM Studio, Ollama, vLLM) typically need no key.
        if self.api_key.is_none() && !is_local_url(&self.base_url) {
            return Err(LlmError::ApiKeyNotConfigured {
                provider: "openai-compat".to_string(),
            });
        }

        debug!(model = %self.model, base_url = %self.base_url, "OpenAI-compatible completion");
        let body = self.build_request(system, messages, max_tokens);
        let value = post_json(&self.client, &self.base_url, self.api_key.as_deref(), &body).await?;
        parse_response(value)
    }
}

impl std::fmt::Debug for OpenAiCompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

fn parse_response(value: Value) -> LlmResult<LlmResponse> {
    let response: OpenAiResponse =
        serde_json::from_value(value).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("No text in response".to_string()))?;
    Ok(LlmResponse {
        text,
        usage: response.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
    })
}

/// Check whether a URL points to a local endpoint (localhost, 127.0.0.1, etc.)
/// where an API key is typically not required.
fn is_local_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("localhost") || lower.contains("127.0.0.1") || lower.contains("[::1]")
}
