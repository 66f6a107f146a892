//! Transcript entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Whether a message is a normal entry or reports a failed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Final,
    Error,
}

/// One entry in the conversation transcript.
///
/// Messages are immutable once built; only the turn controller creates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    role: Role,
    content: String,
    status: MessageStatus,
    created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), MessageStatus::Final)
    }

    pub(crate) fn answer(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), MessageStatus::Final)
    }

    pub(crate) fn failure(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), MessageStatus::Error)
    }

    fn new(role: Role, content: String, status: MessageStatus) -> Self {
        Self {
            role,
            content,
            status,
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> MessageStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_error(&self) -> bool {
        self.status == MessageStatus::Error
    }
}
