//! JSON-over-HTTPS plumbing shared by the providers.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{LlmError, LlmResult};

/// POST a JSON body and decode a JSON reply.
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    api_key: Option<&str>,
    body: &Value,
) -> LlmResult<Value> {
    let mut request = client.post(url).header(CONTENT_TYPE, "application/json");

    if let Some(api_key) = api_key {
        let mut auth_value = HeaderValue::try_from(format!("Bearer {api_key}"))
            .map_err(|e| LlmError::ApiRequestFailed(format!("Invalid API key characters: {e}")))?;
        auth_value.set_sensitive(true);
        request = request.header(AUTHORIZATION, auth_value);
    }

    debug!(url, "sending completion request");
    let response = request.json(body).send().await?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1);
        return Err(LlmError::RateLimitExceeded { retry_after_secs });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, "completion request rejected");
        return Err(LlmError::ApiStatus {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| LlmError::InvalidResponse(e.to_string()))
}
