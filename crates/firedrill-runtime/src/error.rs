//! Runtime error types.

use thiserror::Error;

/// Errors that can occur in the runtime.
///
/// Command rejections are not errors at this level; they come back as a
/// failed [`crate::CommandResult`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A snapshot could not be encoded or decoded.
    #[error("Snapshot error: {0}")]
    SnapshotError(#[from] firedrill_core::SnapshotError),

    /// LLM provider construction failed.
    #[error("LLM error: {0}")]
    LlmError(#[from] firedrill_llm::LlmError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
