//! Relay error type and the JSON error envelope.
//!
//! Every failure leaves the relay as `{"error": "<message>"}`, the same shape
//! the answering service uses, so browser clients only handle one envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 Bad Request - missing or undecodable question body.
    #[error("{0}")]
    BadRequest(String),
    /// 500 Internal Server Error - the answering service failed or could not
    /// be reached.
    #[error("{0}")]
    Upstream(String),
    /// 500 Internal Server Error - unexpected relay failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::BadRequest(msg) => tracing::debug!("Rejected relay request: {}", msg),
            ApiError::Upstream(msg) => tracing::warn!("Upstream request failed: {}", msg),
            ApiError::Internal(msg) => tracing::error!("Relay error: {}", msg),
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<sakila_core::SakilaError> for ApiError {
    fn from(err: sakila_core::SakilaError) -> Self {
        match err {
            sakila_core::SakilaError::Transport(msg) => ApiError::Upstream(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
