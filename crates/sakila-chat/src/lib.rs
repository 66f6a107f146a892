//! Chat interaction controller for the Sakila assistant.
//!
//! Owns the conversation transcript, runs one request per user turn against
//! the remote answering service, and projects the transcript into rows for
//! the different chat surfaces.

pub mod controller;
pub mod error;
pub mod http;
pub mod message;
pub mod render;
pub mod state;
pub mod transcript;
pub mod transport;

pub use controller::{ChatSnapshot, FailureText, Settlement, TurnController, TurnHandle};
pub use error::ChatError;
pub use http::{AskRequest, HttpTransport};
pub use message::{Message, MessageStatus, Role};
pub use render::{project, Align, PageSkin, Row, RowKind, Skin, TerminalSkin, View, WidgetSkin};
pub use state::TurnState;
pub use transcript::Transcript;
pub use transport::{AnswerPayload, AnswerTransport, AskOutcome, FnTransport};
