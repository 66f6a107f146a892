//! Transport adapter contract.
//!
//! The controller only depends on the three-way [`AskOutcome`]. Every
//! lower-level failure shape (refused connection, timeout, bad status,
//! malformed body, missing field) is folded into one of the two error kinds
//! by the adapter before it reaches the controller.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde_json::Value;

/// A successful answer, either plain text or a structured result.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerPayload {
    Text(String),
    Structured(Value),
}

impl AnswerPayload {
    /// Human-readable form written into the transcript.
    ///
    /// Plain text is used verbatim; structured results are pretty-printed JSON.
    pub fn to_display_text(&self) -> String {
        match self {
            AnswerPayload::Text(text) => text.clone(),
            AnswerPayload::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// Result of asking the remote service one question.
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    /// The service answered.
    Answer(AnswerPayload),
    /// The service was reached but reported a failure.
    ServiceError { message: Option<String> },
    /// The service could not be reached or answered with something unusable.
    TransportError { message: String },
}

impl AskOutcome {
    pub fn transport(message: impl Into<String>) -> Self {
        AskOutcome::TransportError {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AskOutcome::Answer(_) => "answer",
            AskOutcome::ServiceError { .. } => "service_error",
            AskOutcome::TransportError { .. } => "transport_error",
        }
    }
}

/// The sole point of contact with the remote answering service.
///
/// Implementations must not panic on bad input from the wire; every failure
/// is returned as an [`AskOutcome`] variant.
#[async_trait]
pub trait AnswerTransport: Send + Sync {
    async fn ask(&self, question: &str) -> AskOutcome;
}

/// Map a decoded 2xx response body to an outcome.
///
/// Both `result` and `answer` are accepted as the answer field, `result`
/// taking precedence. Falsy values (`null`, `false`, `""`, `0`) count as
/// absent. A body with neither an answer nor a non-empty `error` string is a
/// service failure without a message.
pub fn normalize_body(body: &Value) -> AskOutcome {
    let Some(object) = body.as_object() else {
        return AskOutcome::transport("malformed response: expected a JSON object");
    };

    for field in ["result", "answer"] {
        if let Some(value) = object.get(field).filter(|v| is_truthy(v)) {
            let payload = match value {
                Value::String(text) => AnswerPayload::Text(text.clone()),
                other => AnswerPayload::Structured(other.clone()),
            };
            return AskOutcome::Answer(payload);
        }
    }

    let message = match object.get("error") {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        Some(other) if is_truthy(other) && !other.is_string() => Some(other.to_string()),
        _ => None,
    };
    AskOutcome::ServiceError { message }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

type AskFuture = Pin<Box<dyn Future<Output = AskOutcome> + Send>>;

/// Transport backed by a closure, used for in-process surfaces and tests.
pub struct FnTransport<F> {
    f: F,
}

impl<F> FnTransport<F>
where
    F: Fn(String) -> AskFuture + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

/// Build an [`FnTransport`] from an async closure-like function.
pub fn from_fn<F, Fut>(f: F) -> FnTransport<impl Fn(String) -> AskFuture + Send + Sync>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AskOutcome> + Send + 'static,
{
    FnTransport::new(move |question: String| -> AskFuture { Box::pin(f(question)) })
}

#[async_trait]
impl<F> AnswerTransport for FnTransport<F>
where
    F: Fn(String) -> AskFuture + Send + Sync,
{
    async fn ask(&self, question: &str) -> AskOutcome {
        (self.f)(question.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_plain_answer() {
        let outcome = normalize_body(&json!({"answer": "Forrest Gump, Big"}));
        assert_eq!(
            outcome,
            AskOutcome::Answer(AnswerPayload::Text("Forrest Gump, Big".to_string()))
        );
    }

    #[test]
    fn test_normalize_structured_result() {
        let rows = json!([{"title": "BIG"}, {"title": "SPLASH"}]);
        let outcome = normalize_body(&json!({"result": rows.clone()}));
        assert_eq!(outcome, AskOutcome::Answer(AnswerPayload::Structured(rows)));
    }

    #[test]
    fn test_normalize_result_takes_precedence_over_answer() {
        let outcome = normalize_body(&json!({"result": "from result", "answer": "from answer"}));
        assert_eq!(
            outcome,
            AskOutcome::Answer(AnswerPayload::Text("from result".to_string()))
        );
    }

    #[test]
    fn test_normalize_falsy_result_falls_through() {
        let outcome = normalize_body(&json!({"result": "", "answer": "fallback"}));
        assert_eq!(
            outcome,
            AskOutcome::Answer(AnswerPayload::Text("fallback".to_string()))
        );

        let outcome = normalize_body(&json!({"result": null, "error": "no such table"}));
        assert_eq!(
            outcome,
            AskOutcome::ServiceError {
                message: Some("no such table".to_string())
            }
        );
    }

    #[test]
    fn test_normalize_error_without_message() {
        assert_eq!(
            normalize_body(&json!({})),
            AskOutcome::ServiceError { message: None }
        );
        assert_eq!(
            normalize_body(&json!({"error": ""})),
            AskOutcome::ServiceError { message: None }
        );
    }

    #[test]
    fn test_normalize_whitespace_error_is_kept() {
        assert_eq!(
            normalize_body(&json!({"error": "   "})),
            AskOutcome::ServiceError {
                message: Some("   ".to_string())
            }
        );
    }

    #[test]
    fn test_normalize_non_object_is_transport_error() {
        assert!(matches!(
            normalize_body(&json!(["a", "b"])),
            AskOutcome::TransportError { .. }
        ));
        assert!(matches!(
            normalize_body(&json!("just text")),
            AskOutcome::TransportError { .. }
        ));
    }

    #[test]
    fn test_display_text() {
        assert_eq!(
            AnswerPayload::Text("verbatim **md**".to_string()).to_display_text(),
            "verbatim **md**"
        );
        let structured = AnswerPayload::Structured(json!({"count": 2}));
        assert_eq!(structured.to_display_text(), "{\n  \"count\": 2\n}");
    }

    #[tokio::test]
    async fn test_fn_transport() {
        let transport = from_fn(|q: String| async move {
            AskOutcome::Answer(AnswerPayload::Text(format!("echo: {}", q)))
        });
        let outcome = transport.ask("hi").await;
        assert_eq!(
            outcome,
            AskOutcome::Answer(AnswerPayload::Text("echo: hi".to_string()))
        );
        assert_eq!(outcome.kind(), "answer");
    }
}
