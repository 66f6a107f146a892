//! Error types for the chat controller.
//!
//! Service and transport failures are never reported through these: they
//! become assistant messages in the transcript. `ChatError` only tells a
//! caller why a call had no effect.

use sakila_core::SakilaError;

/// Reasons a controller call was a no-op, plus transport construction errors.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("a question is already waiting for an answer")]
    TurnInFlight,
    #[error("chat session is closed")]
    SessionClosed,
    #[error("no async runtime available to dispatch the question")]
    NoRuntime,
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<ChatError> for SakilaError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Transport(msg) => SakilaError::Transport(msg),
            other => SakilaError::Api(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(
            ChatError::EmptyQuestion.to_string(),
            "question cannot be empty"
        );
        assert_eq!(
            ChatError::TurnInFlight.to_string(),
            "a question is already waiting for an answer"
        );
        assert_eq!(ChatError::SessionClosed.to_string(), "chat session is closed");
        assert_eq!(
            ChatError::NoRuntime.to_string(),
            "no async runtime available to dispatch the question"
        );
        assert_eq!(
            ChatError::Transport("bad endpoint".to_string()).to_string(),
            "transport error: bad endpoint"
        );
    }

    #[test]
    fn test_chat_error_into_sakila_error() {
        let err: SakilaError = ChatError::Transport("tls".to_string()).into();
        assert!(matches!(err, SakilaError::Transport(_)));

        let err: SakilaError = ChatError::TurnInFlight.into();
        assert!(matches!(err, SakilaError::Api(_)));
    }
}
