//! Ordered, append-only conversation transcript.

use crate::message::Message;

/// The single source of truth for what a chat surface renders.
///
/// Entries are kept in append order. There is no update or delete; the whole
/// transcript can only be cleared by a session reset.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message at the end.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Copy of the current ordered sequence, for rendering.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}
