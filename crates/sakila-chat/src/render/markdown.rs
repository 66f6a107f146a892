//! Sanitizing markdown interpreter.
//!
//! Assistant content comes from a remote service and is never trusted as
//! markup. Raw HTML is demoted to literal text, links keep only `http`,
//! `https`, `mailto` or relative destinations, and images collapse to their
//! alt text.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Render markdown to HTML that is safe to inject into a page.
pub fn to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, sanitized(markdown));
    out
}

/// Flatten markdown to plain text for a terminal.
///
/// Headings keep their `#` markers, lists get bullets or numbers, code blocks
/// are indented four spaces. Control characters other than newline and tab
/// are removed so service text cannot drive the terminal.
pub fn to_plain(markdown: &str) -> String {
    let mut out = String::new();
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut in_code_block = false;

    for event in sanitized(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                ensure_line_start(&mut out);
                out.push_str(&"#".repeat(level as usize));
                out.push(' ');
            }
            Event::End(TagEnd::Heading(_)) => block_break(&mut out),
            Event::End(TagEnd::Paragraph) => {
                if lists.is_empty() {
                    block_break(&mut out);
                } else {
                    ensure_line_start(&mut out);
                }
            }
            Event::Start(Tag::List(start)) => {
                ensure_line_start(&mut out);
                lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                lists.pop();
                if lists.is_empty() {
                    block_break(&mut out);
                }
            }
            Event::Start(Tag::Item) => {
                ensure_line_start(&mut out);
                out.push_str(&"  ".repeat(lists.len().saturating_sub(1)));
                match lists.last_mut() {
                    Some(Some(n)) => {
                        out.push_str(&format!("{}. ", n));
                        *n += 1;
                    }
                    _ => out.push_str("- "),
                }
            }
            Event::End(TagEnd::Item) => ensure_line_start(&mut out),
            Event::TaskListMarker(done) => out.push_str(if done { "[x] " } else { "[ ] " }),
            Event::Start(Tag::CodeBlock(_)) => {
                ensure_line_start(&mut out);
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                block_break(&mut out);
            }
            Event::End(TagEnd::TableCell) => out.push_str(" | "),
            Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => {
                let trimmed = out.trim_end_matches(" | ").len();
                out.truncate(trimmed);
                out.push('\n');
            }
            Event::End(TagEnd::Table) => block_break(&mut out),
            Event::Text(text) => {
                if in_code_block {
                    for line in text.lines() {
                        out.push_str("    ");
                        out.push_str(line);
                        out.push('\n');
                    }
                } else {
                    out.push_str(&text);
                }
            }
            Event::Code(code) => {
                out.push('`');
                out.push_str(&code);
                out.push('`');
            }
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Rule => {
                ensure_line_start(&mut out);
                out.push_str("---");
                block_break(&mut out);
            }
            _ => {}
        }
    }

    out.retain(|c| !c.is_control() || c == '\n' || c == '\t');
    out.truncate(out.trim_end().len());
    out
}

/// Escape text for use inside HTML element content or a double-quoted
/// attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing to a String is infallible.
    let _ = pulldown_cmark_escape::escape_html(&mut out, text);
    out
}

fn ensure_line_start(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn block_break(out: &mut String) {
    ensure_line_start(out);
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
}

fn sanitized(markdown: &str) -> Sanitize<Parser<'_>> {
    Sanitize {
        inner: Parser::new_ext(markdown, options()),
        links: Vec::new(),
    }
}

/// Event filter applied before any output is produced.
struct Sanitize<I> {
    inner: I,
    /// One entry per open link: whether its start tag was kept.
    links: Vec<bool>,
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for Sanitize<I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        loop {
            let event = self.inner.next()?;

            if let Event::Start(Tag::Link { dest_url, .. }) = &event {
                let safe = is_safe_url(dest_url);
                self.links.push(safe);
                if safe {
                    return Some(event);
                }
                continue;
            }

            match event {
                Event::Html(raw) | Event::InlineHtml(raw) => return Some(Event::Text(raw)),
                Event::Start(Tag::HtmlBlock) => return Some(Event::Start(Tag::Paragraph)),
                Event::End(TagEnd::HtmlBlock) => return Some(Event::End(TagEnd::Paragraph)),
                Event::End(TagEnd::Link) => {
                    if self.links.pop().unwrap_or(false) {
                        return Some(Event::End(TagEnd::Link));
                    }
                }
                Event::Start(Tag::Image { .. }) | Event::End(TagEnd::Image) => {}
                other => return Some(other),
            }
        }
    }
}

fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    match url.find([':', '/', '?', '#']) {
        Some(i) if url[i..].starts_with(':') => {
            let scheme = url[..i].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}
