//! Error types shared across the scanner.
//!
//! `ApiError` covers everything that can go wrong talking to CoinGecko and
//! is recoverable at the cycle level. `ScanError` covers the two fatal
//! operator-input failures that terminate the process with exit code 1.

use thiserror::Error;

/// Errors from the CoinGecko fetch path.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-success HTTP status, including a 429 that survived the retry
    /// budget. Carries the response body for the operator.
    #[error("{label}: HTTP {status}: {body}")]
    Status {
        label: String,
        status: u16,
        body: String,
    },

    /// Connection / timeout / protocol failure below the HTTP layer.
    #[error("{label}: request failed: {message}")]
    Transport { label: String, message: String },

    /// The response arrived but did not match the expected JSON shape.
    #[error("{label}: unexpected response shape: {message}")]
    Decode { label: String, message: String },
}

impl ApiError {
    /// HTTP status code, when this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Fatal errors that end the process rather than the cycle.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("could not read input from user: {0}")]
    Stdin(#[from] std::io::Error),
}

/// Result alias for the fetch path.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
