//! Turn state machine.
//!
//! A controller is either idle or waiting on exactly one answer:
//! - Idle -> Pending (question dispatched)
//! - Pending -> Idle (answer, service error, or transport failure recorded)

use std::fmt;

use serde::Serialize;

/// Whether a turn is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnState {
    /// Ready to accept a question.
    #[default]
    Idle,
    /// A question was sent and its settlement has not been recorded yet.
    Pending,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnState::Idle => write!(f, "Idle"),
            TurnState::Pending => write!(f, "Pending"),
        }
    }
}

impl TurnState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &TurnState) -> bool {
        matches!(
            (self, target),
            (TurnState::Idle, TurnState::Pending) | (TurnState::Pending, TurnState::Idle)
        )
    }

    pub fn is_pending(&self) -> bool {
        *self == TurnState::Pending
    }
}
