//! Error types for Reel.

use thiserror::Error;

/// Main error type for Reel operations.
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The in-memory model is corrupted; the current operation must abort.
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

/// Result type alias for Reel operations.
pub type Result<T> = std::result::Result<T, ReelError>;
