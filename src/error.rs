//! Error types for sensor fetches.

use thiserror::Error;

/// Errors that can occur while fetching or decoding a sensor response.
///
/// None of these are fatal: the scheduler logs and drops them, and the next
/// tick simply tries again.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("server returned status {0}")]
    Status(u16),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Response body is not a finite number.
    #[error("malformed reading: {0:?}")]
    Malformed(String),

    /// Failed to parse a JSON response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
