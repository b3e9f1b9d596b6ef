//! LLM-related error types.

use thiserror::Error;

/// Errors that can occur with LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// API key not configured.
    #[error("API key not configured for {provider}")]
    ApiKeyNotConfigured {
        /// Provider name.
        provider: String,
    },

    /// The provider is switched off or reported itself unavailable.
    #[error("language model unavailable: {0}")]
    Unavailable(String),

    /// API request failed before a response arrived.
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// The API answered with a non-success status.
    #[error("API returned HTTP {status}: {body}")]
    ApiStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimitExceeded {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Invalid response from API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// HTTP error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Whether the backend is unreachable or refuses us outright, as opposed
    /// to failing on this particular request.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::ApiKeyNotConfigured { .. } | Self::Unavailable(_) => true,
            Self::ApiStatus { status, .. } => matches!(status, 401 | 403),
            Self::HttpError(e) => e.is_connect(),
            _ => false,
        }
    }
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_classification() {
        assert!(
            LlmError::ApiKeyNotConfigured {
                provider: "workers-ai".into()
            }
            .is_unavailable()
        );
        assert!(LlmError::Unavailable("off".into()).is_unavailable());
        assert!(
            LlmError::ApiStatus {
                status: 401,
                body: String::new()
            }
            .is_unavailable()
        );
        assert!(
            !LlmError::ApiStatus {
                status: 500,
                body: String::new()
            }
            .is_unavailable()
        );
        assert!(!LlmError::InvalidResponse("garbage".into()).is_unavailable());
        assert!(
            !LlmError::RateLimitExceeded {
                retry_after_secs: 3
            }
            .is_unavailable()
        );
    }
}
