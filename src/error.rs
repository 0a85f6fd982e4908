//! Error types for the omnisearch application layer.

use omnisearch_fanout::{FanoutError, ProviderError};

/// Top-level error type for configuration, hosting and adapter setup.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be parsed or failed validation.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A provider adapter could not be constructed.
    #[error("provider error: {0}")]
    Provider(String),

    /// The stdio host failed to read or write a message.
    #[error("host error: {0}")]
    Host(String),
}

impl From<FanoutError> for AppError {
    fn from(e: FanoutError) -> Self {
        match e {
            FanoutError::Config(msg) => Self::Config(msg),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
