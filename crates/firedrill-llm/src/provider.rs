//! LLM provider trait and provider selection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LlmError, LlmResult};
use crate::openai_compat::OpenAiCompatProvider;
use crate::types::{LlmResponse, Message};
use crate::workers_ai::WorkersAiProvider;

/// Text generation capability.
///
/// Narration treats every error as recoverable: callers fall back to canned
/// text, so implementations should fail fast rather than retry.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Get the model being used.
    fn model(&self) -> &str;

    /// Complete a conversation.
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        max_tokens: u32,
    ) -> LlmResult<LlmResponse>;
}

/// Which backend generates narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Cloudflare Workers AI REST API.
    WorkersAi,
    /// Any `OpenAI`-compatible chat completions endpoint.
    OpenAiCompat,
    /// No backend; narration always uses fallback text.
    Disabled,
}

impl ProviderKind {
    /// Names accepted in configuration.
    pub const NAMES: [&'static str; 3] = ["workers-ai", "openai-compat", "none"];

    /// Configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WorkersAi => "workers-ai",
            Self::OpenAiCompat => "openai-compat",
            Self::Disabled => "none",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "workers-ai" | "workers_ai" | "cloudflare" => Ok(Self::WorkersAi),
            "openai-compat" | "openai_compat" | "openai" => Ok(Self::OpenAiCompat),
            "none" | "disabled" | "off" => Ok(Self::Disabled),
            other => Err(LlmError::ConfigError(format!(
                "unknown provider '{other}' (expected one of: {})",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// Configuration for LLM providers.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Backend.
    pub kind: ProviderKind,
    /// Model name.
    pub model: String,
    /// API key or token.
    pub api_key: Option<String>,
    /// Endpoint override.
    pub api_url: Option<String>,
    /// Cloudflare account id (Workers AI only).
    pub account_id: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.as_ref().is_some_and(|k| !k.is_empty()))
            .field("api_url", &self.api_url)
            .field("has_account_id", &self.account_id.is_some())
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::WorkersAi,
            model: crate::workers_ai::DEFAULT_MODEL.to_string(),
            api_key: None,
            api_url: None,
            account_id: None,
            temperature: 0.7,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A provider that is always unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledProvider;

#[async_trait]
impl LlmProvider for DisabledProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "none"
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn model(&self) -> &str {
        "none"
    }

    async fn complete(
        &self,
        _system: &str,
        _messages: &[Message],
        _max_tokens: u32,
    ) -> LlmResult<LlmResponse> {
        Err(LlmError::Unavailable(
            "no language model provider configured".to_string(),
        ))
    }
}

/// Build the provider selected by the configuration.
///
/// Missing credentials are not an error here: the provider reports
/// [`LlmError::ApiKeyNotConfigured`] on use and narration falls back.
///
/// # Errors
///
/// Returns [`LlmError::ConfigError`] if the HTTP client cannot be built.
pub fn create_provider(config: &ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.kind {
        ProviderKind::WorkersAi => Arc::new(WorkersAiProvider::from_config(config)?),
        ProviderKind::OpenAiCompat => Arc::new(OpenAiCompatProvider::from_config(config)?),
        ProviderKind::Disabled => Arc::new(DisabledProvider),
    };
    Ok(provider)
}

pub(crate) fn http_client(timeout: Duration) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::ConfigError(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parsing() {
        assert_eq!("workers-ai".parse::<ProviderKind>().unwrap(), ProviderKind::WorkersAi);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAiCompat);
        assert_eq!("none".parse::<ProviderKind>().unwrap(), ProviderKind::Disabled);
        let err = "gpt".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("workers-ai, openai-compat, none"));
    }

    #[test]
    fn debug_hides_api_key() {
        let config = ProviderConfig {
            api_key: Some("sk-super-secret".into()),
            ..ProviderConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-super-secret"));
        assert!(debug.contains("has_api_key: true"));
    }

    #[tokio::test]
    async fn disabled_provider_is_unavailable() {
        let err = DisabledProvider
            .complete("", &[Message::user("hi")], 10)
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn create_selects_backend() {
        for (kind, name) in [
            (ProviderKind::WorkersAi, "workers-ai"),
            (ProviderKind::OpenAiCompat, "openai-compat"),
            (ProviderKind::Disabled, "none"),
        ] {
            let config = ProviderConfig {
                kind,
                ..ProviderConfig::default()
            };
            assert_eq!(create_provider(&config).unwrap().name(), name);
        }
    }
}
