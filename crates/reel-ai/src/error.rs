//! Error types for the naming services.

use thiserror::Error;

/// Errors that can occur while asking a service for a name.
#[derive(Debug, Error)]
pub enum AiError {
    /// No API key or endpoint was configured.
    #[error("Naming service not configured: {0}")]
    NotConfigured(String),

    /// Transport-level failure talking to the service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered, but without a usable name.
    #[error("Empty response from naming service")]
    EmptyResponse,

    /// Nothing to name.
    #[error("No input to name")]
    NoInput,
}

/// Result type alias for naming operations.
pub type AiResult<T> = std::result::Result<T, AiError>;
