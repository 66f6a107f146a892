//! HTTP transport to the answering service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sakila_core::config::ServiceConfig;

use crate::error::ChatError;
use crate::transport::{normalize_body, AnswerTransport, AskOutcome};

/// Wire body of a question, shared with the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Posts `{"question": ...}` as JSON to the service endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a transport for `endpoint`, with an optional request timeout.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, ChatError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ChatError::Transport(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ChatError> {
        Self::new(&config.endpoint, config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait]
impl AnswerTransport for HttpTransport {
    async fn ask(&self, question: &str) -> AskOutcome {
        let request = AskRequest {
            question: question.to_string(),
        };

        let response = match self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return AskOutcome::transport(describe_send_error(&e)),
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return AskOutcome::transport(format!("failed to read response: {}", e)),
        };

        if !status.is_success() {
            return AskOutcome::transport(describe_status(status, &bytes));
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => normalize_body(&body),
            Err(e) => AskOutcome::transport(format!("malformed response: {}", e)),
        }
    }
}

fn describe_send_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        format!("request failed: {}", err)
    }
}

/// Include the `error` field of a JSON error envelope when there is one.
fn describe_status(status: StatusCode, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<Value>(body).ok().and_then(|v| {
        v.get("error")
            .and_then(|e| e.as_str())
            .map(|s| s.to_string())
    });
    match detail {
        Some(detail) => format!("service returned {}: {}", status, detail),
        None => format!("service returned {}", status),
    }
}
