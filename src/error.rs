//! Error types and transport error mapping

use thiserror::Error;

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while building or running requests
#[derive(Debug, Error)]
pub enum Error {
    /// The request URL could not be resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Parameters, headers or credentials could not be encoded into the request
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Transport level failure
    #[error("Network error: {message}")]
    Network {
        /// Error message
        message: String,
    },

    /// Timeout error
    #[error("Request timed out")]
    Timeout,

    /// The operation was cancelled before it completed
    #[error("Request was cancelled")]
    Cancelled,

    /// The response was awaited on an operation that was never resumed
    #[error("Request was never started")]
    NotStarted,

    /// The response was rejected by the validator
    #[error("Response validation failed with status {status}: {reason}")]
    Validation {
        /// HTTP status of the rejected response
        status: u16,
        /// Why the response was rejected
        reason: String,
    },

    /// UTF-8 conversion error
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert a reqwest error to our Error type
    pub(crate) fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::Timeout
        } else if error.is_builder() {
            Error::InvalidUrl(error.to_string())
        } else {
            Error::Network {
                message: error.to_string(),
            }
        }
    }
}
