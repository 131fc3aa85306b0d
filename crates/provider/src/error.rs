//! Gateway error type.

use thiserror::Error;

/// Why a remote call produced no usable result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
