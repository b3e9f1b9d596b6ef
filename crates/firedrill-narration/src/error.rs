//! Narration error types.

use std::time::Duration;

use firedrill_llm::LlmError;
use thiserror::Error;

/// Why generated narration could not be used.
///
/// Every variant is recovered with fallback text.
#[derive(Debug, Error)]
pub enum NarrationError {
    /// No backend, missing credentials, or the backend refused us.
    #[error("narration backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered, but not usefully.
    #[error("narration failed: {0}")]
    Failed(String),

    /// The backend did not answer in time.
    #[error("narration timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

impl From<LlmError> for NarrationError {
    fn from(err: LlmError) -> Self {
        if err.is_unavailable() {
            Self::Unavailable(err.to_string())
        } else {
            Self::Failed(err.to_string())
        }
    }
}

/// Result type for narration.
pub type NarrationResult<T> = Result<T, NarrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_errors_are_classified() {
        let unavailable = NarrationError::from(LlmError::Unavailable("off".into()));
        assert!(matches!(unavailable, NarrationError::Unavailable(_)));

        let forbidden = NarrationError::from(LlmError::ApiStatus {
            status: 403,
            body: String::new(),
        });
        assert!(matches!(forbidden, NarrationError::Unavailable(_)));

        let bad = NarrationError::from(LlmError::InvalidResponse("empty".into()));
        assert!(matches!(bad, NarrationError::Failed(_)));
    }

    #[test]
    fn timeout_message() {
        let err = NarrationError::TimedOut(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "narration timed out after 1500ms");
    }
}
