//! Submission error types.

use thiserror::Error;

/// Errors that can occur while sending a booking.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The request could not be sent or the connection failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured endpoint is empty or not an absolute http(s) URL.
    #[error("invalid endpoint: {0:?}")]
    InvalidEndpoint(String),
}

/// Result type for submission operations.
pub type Result<T> = std::result::Result<T, SubmitError>;
