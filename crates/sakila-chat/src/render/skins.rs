//! Skins for the floating widget, the full-page chat, and the terminal.

use crate::message::{Message, Role};
use crate::render::markdown::{escape_html, to_html, to_plain};
use crate::render::{Row, Skin};

fn status_class(message: &Message) -> &'static str {
    if message.is_error() {
        " chat-error"
    } else {
        ""
    }
}

/// Compact floating chat widget.
///
/// User questions are shown as escaped plain text with preserved line breaks;
/// assistant content goes through the markdown interpreter.
#[derive(Debug, Clone)]
pub struct WidgetSkin {
    pub working_text: String,
}

impl Default for WidgetSkin {
    fn default() -> Self {
        Self {
            working_text: "AI is answering...".to_string(),
        }
    }
}

impl Skin for WidgetSkin {
    fn message_row(&self, message: &Message) -> Row {
        let body = match message.role() {
            Role::User => format!(
                "<div class=\"chat-widget-row chat-user\" style=\"text-align:right;white-space:pre-wrap\">{}</div>",
                escape_html(message.content())
            ),
            Role::Assistant => format!(
                "<div class=\"chat-widget-row chat-assistant{}\">{}</div>",
                status_class(message),
                to_html(message.content())
            ),
        };
        Row::for_message(message, body)
    }

    fn working_row(&self) -> Row {
        Row::working(format!(
            "<div class=\"chat-widget-row chat-working\"><em>{}</em></div>",
            escape_html(&self.working_text)
        ))
    }
}

/// Full-page chat with speech bubbles; every message is markdown.
#[derive(Debug, Clone)]
pub struct PageSkin {
    pub working_text: String,
}

impl Default for PageSkin {
    fn default() -> Self {
        Self {
            working_text: "Thinking...".to_string(),
        }
    }
}

impl Skin for PageSkin {
    fn message_row(&self, message: &Message) -> Row {
        let side = match message.role() {
            Role::User => "chat-user",
            Role::Assistant => "chat-assistant",
        };
        let body = format!(
            "<div class=\"chat-page-row {}{}\"><div class=\"chat-bubble\">{}</div></div>",
            side,
            status_class(message),
            to_html(message.content())
        );
        Row::for_message(message, body)
    }

    fn working_row(&self) -> Row {
        Row::working(format!(
            "<div class=\"chat-page-row chat-working\"><div class=\"chat-bubble\"><em>{}</em></div></div>",
            escape_html(&self.working_text)
        ))
    }
}

/// Plain-text rows for the command line.
#[derive(Debug, Clone)]
pub struct TerminalSkin {
    pub user_label: String,
    pub assistant_label: String,
    pub error_label: String,
    pub working_text: String,
}

impl Default for TerminalSkin {
    fn default() -> Self {
        Self {
            user_label: "you".to_string(),
            assistant_label: "sakila".to_string(),
            error_label: "error".to_string(),
            working_text: "thinking...".to_string(),
        }
    }
}

impl TerminalSkin {
    /// Prefix the first line with `label> ` and indent the rest to match.
    fn labelled(label: &str, text: &str) -> String {
        let prefix = format!("{}> ", label);
        let indent = " ".repeat(prefix.chars().count());
        let mut out = String::new();
        for (i, line) in text.lines().enumerate() {
            if i == 0 {
                out.push_str(&prefix);
            } else {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str(&indent);
                }
            }
            out.push_str(line);
        }
        if out.is_empty() {
            out.push_str(prefix.trim_end());
        }
        out
    }
}

impl Skin for TerminalSkin {
    fn message_row(&self, message: &Message) -> Row {
        let body = match message.role() {
            Role::User => {
                let mut text = message.content().to_string();
                text.retain(|c| !c.is_control() || c == '\n' || c == '\t');
                Self::labelled(&self.user_label, &text)
            }
            Role::Assistant if message.is_error() => {
                Self::labelled(&self.error_label, &to_plain(message.content()))
            }
            Role::Assistant => Self::labelled(&self.assistant_label, &to_plain(message.content())),
        };
        Row::for_message(message, body)
    }

    fn working_row(&self) -> Row {
        Row::working(format!("{}> {}", self.assistant_label, self.working_text))
    }
}
