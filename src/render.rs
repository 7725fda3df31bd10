//! Output rendering for chat sessions.
//!
//! This module provides the renderer trait a session reports to while a reply streams in,
//! and a plain-text implementation for terminals.

use std::io::{self, Stdout, Write};

use crate::types::{ChatMessage, ChatRole};

/// Marker appended to a partial reply while more text is expected.
pub const CURSOR_MARKER: &str = "▌";

/// ANSI escape code for dim text (used for system messages and markers).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for role labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for cyan text (used for the assistant label).
const ANSI_CYAN: &str = "\x1b[36m";

/// Moves back over the cursor marker, blanks it, and moves back again.
const ERASE_CURSOR: &str = "\x08 \x08";

/// Trait for rendering a chat session.
///
/// A session calls [`print_partial`](Renderer::print_partial) once per arrived fragment with
/// the whole reply so far followed by [`CURSOR_MARKER`], then exactly one of
/// [`finish_response`](Renderer::finish_response) or
/// [`abandon_response`](Renderer::abandon_response).
pub trait Renderer: Send {
    /// Called before the first fragment of a reply.
    fn start_response(&mut self) {}

    /// Show the accumulated partial reply, cursor marker included.
    fn print_partial(&mut self, partial: &str);

    /// Show the final reply without the cursor marker.
    fn finish_response(&mut self, text: &str);

    /// The reply failed after `start_response`; whatever was shown, possibly nothing, will not
    /// be kept.
    fn abandon_response(&mut self) {}

    /// Print a one-line error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print a complete transcript message, labelled by role.
    fn print_message(&mut self, message: &ChatMessage);
}

/// Plain text renderer with optional ANSI styling.
///
/// Only the newly arrived suffix of each partial reply is written, so output can be piped.
/// The cursor marker is drawn only when styling is enabled, since erasing it relies on the
/// terminal honoring backspace.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    printed: usize,
    cursor_visible: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            printed: 0,
            cursor_visible: false,
        }
    }

    /// Consumes the renderer, returning its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    // Terminal write failures are not actionable mid-conversation.
    fn write(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn erase_cursor(&mut self) {
        if self.cursor_visible {
            self.write(ERASE_CURSOR);
            self.cursor_visible = false;
        }
    }

    /// Writes whatever part of `text` has not been written yet.
    fn write_unprinted(&mut self, text: &str) {
        let fresh = text.get(self.printed..).unwrap_or(text).to_string();
        self.write(&fresh);
        self.printed = text.len();
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn start_response(&mut self) {
        self.printed = 0;
        self.cursor_visible = false;
    }

    fn print_partial(&mut self, partial: &str) {
        let text = partial.strip_suffix(CURSOR_MARKER).unwrap_or(partial);
        self.erase_cursor();
        self.write_unprinted(text);
        if self.use_color {
            self.write(CURSOR_MARKER);
            self.cursor_visible = true;
        }
        self.flush();
    }

    fn finish_response(&mut self, text: &str) {
        self.erase_cursor();
        self.write_unprinted(text);
        self.write("\n");
        self.printed = 0;
        self.flush();
    }

    fn abandon_response(&mut self) {
        self.erase_cursor();
        if self.printed > 0 {
            let marker = self.styled(ANSI_DIM, " [incomplete]");
            self.write(&marker);
            self.write("\n");
        }
        self.printed = 0;
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        let line = self.styled(ANSI_RED, &format!("Error: {error}"));
        self.write(&line);
        self.write("\n");
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        self.write(info);
        self.write("\n");
        self.flush();
    }

    fn print_message(&mut self, message: &ChatMessage) {
        let label = match message.role() {
            ChatRole::System => self.styled(ANSI_DIM, "System:"),
            ChatRole::User => self.styled(ANSI_BOLD, "You:"),
            ChatRole::Assistant => self.styled(ANSI_CYAN, "Assistant:"),
        };
        let line = format!("{label} {}\n", message.content());
        self.write(&line);
        self.flush();
    }
}
