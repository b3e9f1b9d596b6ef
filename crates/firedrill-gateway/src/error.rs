//! Gateway error types.

use thiserror::Error;

/// Gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {message}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying error.
        message: String,
    },

    /// The server was already stopped.
    #[error("server already stopped")]
    AlreadyStopped,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
