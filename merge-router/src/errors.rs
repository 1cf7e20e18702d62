use crate::config::ValidationError;
use hyper::StatusCode;
use thiserror::Error;

/// Errors that can occur while serving the merged route
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to build upstream request: {0}")]
    RequestBuildError(String),

    #[error("Upstream request failed for {0}: {1}")]
    UpstreamRequestFailed(String, String),

    #[error("Upstream timeout for {0}")]
    UpstreamTimeout(String),

    #[error("Failed to read response body: {0}")]
    ResponseBodyError(String),

    #[error("Response serialization error: {0}")]
    ResponseSerializationError(String),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Status code a caller sees when this error ends a request.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RequestBuildError(_) => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamRequestFailed(..) | GatewayError::UpstreamTimeout(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
