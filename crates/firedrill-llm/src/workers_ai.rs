//! Cloudflare Workers AI provider.
//!
//! Calls `POST {base}/accounts/{account_id}/ai/run/{model}` with a chat
//! message list; the reply text lives at `result.response`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::http::post_json;
use crate::provider::{LlmProvider, ProviderConfig, http_client};
use crate::types::{LlmResponse, Message, chat_messages};

/// Default Workers AI text model.
pub const DEFAULT_MODEL: &str = "@cf/meta/llama-3.1-8b-instruct";

const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Cloudflare Workers AI REST provider.
pub struct WorkersAiProvider {
    client: Client,
    model: String,
    temperature: f64,
    api_base: String,
    account_id: Option<String>,
    api_token: Option<String>,
}

impl WorkersAiProvider {
    /// Build from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigError`] if the HTTP client cannot be built.
    pub fn from_config(config: &ProviderConfig) -> LlmResult<Self> {
        Ok(Self {
            client: http_client(config.request_timeout)?,
            model: config.model.clone(),
            temperature: config.temperature,
            api_base: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            account_id: config.account_id.clone().filter(|a| !a.is_empty()),
            api_token: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn endpoint(&self, account_id: &str) -> String {
        format!(
            "{}/accounts/{account_id}/ai/run/{}",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl LlmProvider for WorkersAiProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "workers-ai"
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
        let (Some(account_id), Some(api_token)) = (&self.account_id, &self.api_token) else {
            return Err(LlmError::ApiKeyNotConfigured {
                provider: "workers-ai".to_string(),
            });
        };

        let url = self.endpoint(account_id);
        debug!(model = %self.model, "Workers AI completion");
        let body = serde_json::json!({
            "messages": chat_messages(system, messages),
            "max_tokens": max_tokens,
            "temperature": self.temperature,
        });
        let value = post_json(&self.client, &url, Some(api_token), &body).await?;
        parse_response(value)
    }
}

impl std::fmt::Debug for WorkersAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkersAiProvider")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("has_account_id", &self.account_id.is_some())
            .field("has_api_token", &self.api_token.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<RunResult>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RunResult {
    response: Option<String>,
}

fn parse_response(value: Value) -> LlmResult<LlmResponse> {
    let run: RunResponse =
        serde_json::from_value(value).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    if run.success == Some(false) {
        let errors: Vec<String> = run
            .errors
            .iter()
            .map(|e| match e.code {
                Some(code) => format!("{code}: {}", e.message),
                None => e.message.clone(),
            })
            .collect();
        // 10000 is Cloudflare's authentication error code.
        if run.errors.iter().any(|e| e.code == Some(10_000)) {
            return Err(LlmError::Unavailable(errors.join("; ")));
        }
        return Err(LlmError::ApiRequestFailed(errors.join("; ")));
    }
    run.result
        .and_then(|r| r.response)
        .filter(|t| !t.trim().is_empty())
        .map(LlmResponse::text)
        .ok_or_else(|| LlmError::InvalidResponse("No text in result.response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_server::serve_once;
    use crate::provider::ProviderKind;

    fn config(api_url: Option<String>) -> ProviderConfig {
        ProviderConfig {
            kind: ProviderKind::WorkersAi,
            api_key: Some("cf-token".into()),
            account_id: Some("acct".into()),
            api_url,
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn endpoint_includes_account_and_model() {
        let provider = WorkersAiProvider::from_config(&config(None)).unwrap();
        assert_eq!(
            provider.endpoint("acct"),
            "https://api.cloudflare.com/client/v4/accounts/acct/ai/run/@cf/meta/llama-3.1-8b-instruct"
        );
    }

    #[tokio::test]
    async fn missing_credentials_are_unavailable() {
        let provider = WorkersAiProvider::from_config(&ProviderConfig::default()).unwrap();
        let err = provider.complete("", &[Message::user("hi")], 10).await.unwrap_err();
        assert!(matches!(err, LlmError::ApiKeyNotConfigured { .. }));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn completes_against_endpoint() {
        let (url, server) = serve_once(
            200,
            r#"{"success":true,"errors":[],"result":{"response":"Kernel panics confirmed."}}"#,
        )
        .await;
        let provider = WorkersAiProvider::from_config(&config(Some(url))).unwrap();
        let response = provider
            .complete("sys", &[Message::user("what now?")], 300)
            .await
            .unwrap();
        assert_eq!(response.text, "Kernel panics confirmed.");
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /accounts/acct/ai/run/@cf/meta/llama-3.1-8b-instruct"));
        assert!(request.contains("\"max_tokens\":300"));
    }

    #[test]
    fn authentication_error_is_unavailable() {
        let err = parse_response(serde_json::json!({
            "success": false,
            "errors": [{ "code": 10000, "message": "Authentication error" }]
        }))
        .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn other_api_errors_are_failures() {
        let err = parse_response(serde_json::json!({
            "success": false,
            "errors": [{ "code": 5007, "message": "No such model" }]
        }))
        .unwrap_err();
        assert!(!err.is_unavailable());
        assert!(err.to_string().contains("5007: No such model"));
    }

    #[test]
    fn empty_response_is_invalid() {
        let err = parse_response(serde_json::json!({ "result": { "response": "  " } })).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
