//! Route handlers for the relay.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sakila_chat::AskRequest;

use crate::error::ApiError;
use crate::state::RelayState;

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Answering service the relay forwards to.
    pub upstream: String,
    pub uptime_secs: u64,
}

/// POST <relay route> - forward a question and return the service JSON as is.
///
/// The service body is not interpreted; `result`, `answer` and `error` fields
/// all reach the client unchanged. Only failures to get a JSON body at all
/// are turned into the relay's own error envelope.
pub async fn relay(
    State(state): State<RelayState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    tracing::debug!(question_len = request.question.len(), "Relaying question");

    let response = state
        .client
        .post(state.upstream.clone())
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Upstream(format!(
            "Request failed with status code {}",
            status.as_u16()
        )));
    }

    let body = response
        .json::<Value>()
        .await
        .map_err(|e| ApiError::Upstream(format!("invalid response from service: {}", e)))?;

    Ok(Json(body))
}

/// GET /health - health check.
pub async fn health(State(state): State<RelayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream: state.upstream.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
