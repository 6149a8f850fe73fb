use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::types::ErrorBody;

/// Failure of a single relay attempt.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(&'static str),
    #[error("upstream transport failed: {0:#}")]
    Transport(anyhow::Error),
    #[error("upstream response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RelayError {
    /// Stable code for server-side logs; never sent to callers.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Config(_) => "config",
            RelayError::Transport(_) => "transport",
            RelayError::Decode(_) => "decode",
        }
    }
}

/// Errors surfaced on the public HTTP contract.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Failed to process prompt")]
    ProcessingFailed,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson => StatusCode::BAD_REQUEST,
            ApiError::ProcessingFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(_: RelayError) -> Self {
        ApiError::ProcessingFailed
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
