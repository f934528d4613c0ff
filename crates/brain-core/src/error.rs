//! Error types for model provider calls.

use thiserror::Error;

/// Errors that can occur while asking a model provider for a completion.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The provider is not configured (missing key, bad client setup).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never reached the provider or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with an error status.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The provider answered, but the payload was unusable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request did not complete within its bound.
    #[error("processing timed out")]
    Timeout,
}
