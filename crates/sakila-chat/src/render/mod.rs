//! Render projector: transcript snapshot to visual rows.
//!
//! Projection is a pure function of a [`ChatSnapshot`]. One row per message,
//! in transcript order, plus a single working indicator row at the end while
//! a turn is pending. Skins decide how a row looks; they never see anything
//! but the message they are rendering.

pub mod markdown;
mod skins;

pub use skins::{PageSkin, TerminalSkin, WidgetSkin};

use crate::controller::ChatSnapshot;
use crate::message::{Message, MessageStatus, Role};

/// Horizontal placement of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    End,
}

/// What a row stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Message { role: Role, status: MessageStatus },
    /// Transient indicator shown while waiting for an answer.
    Working,
}

/// One rendered line item of the conversation view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub kind: RowKind,
    pub align: Align,
    /// Skin-specific markup or text, already sanitized.
    pub body: String,
}

impl Row {
    /// A row for `message`, aligned by role.
    pub fn for_message(message: &Message, body: String) -> Self {
        let align = match message.role() {
            Role::User => Align::End,
            Role::Assistant => Align::Start,
        };
        Self {
            kind: RowKind::Message {
                role: message.role(),
                status: message.status(),
            },
            align,
            body,
        }
    }

    pub fn working(body: String) -> Self {
        Self {
            kind: RowKind::Working,
            align: Align::Start,
            body,
        }
    }

    pub fn is_working(&self) -> bool {
        self.kind == RowKind::Working
    }
}

/// A fully projected conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub rows: Vec<Row>,
}

impl View {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_working_row(&self) -> bool {
        self.rows.last().map(Row::is_working).unwrap_or(false)
    }

    /// Row bodies joined by newlines.
    pub fn render(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.body.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Look of one chat surface.
pub trait Skin {
    fn message_row(&self, message: &Message) -> Row;
    fn working_row(&self) -> Row;
}

/// Project a snapshot into rows using `skin`.
pub fn project<S: Skin + ?Sized>(skin: &S, snapshot: &ChatSnapshot) -> View {
    let mut rows: Vec<Row> = snapshot
        .messages
        .iter()
        .map(|message| skin.message_row(message))
        .collect();
    if snapshot.pending {
        rows.push(skin.working_row());
    }
    View { rows }
}
