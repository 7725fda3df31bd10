//! The ordered record of one conversation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{ChatMessage, ChatRole};

/// File name used when a transcript is downloaded into a directory.
pub const TRANSCRIPT_FILENAME: &str = "chat_history.txt";

/// Conversation turns in the order they happened.
///
/// The transcript is replayed verbatim to the completion service on every request.  It only
/// grows by one user message per submission and one assistant message per completed reply,
/// and only shrinks by being cleared outright.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub(crate) fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when no message has been recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The messages, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// True when the conversation ends in a user turn that never got a reply.
    pub fn awaiting_reply(&self) -> bool {
        self.last()
            .is_some_and(|message| message.role() == ChatRole::User)
    }

    /// Renders each message as `ROLE: content`, separated by blank lines.
    pub fn export_text(&self) -> String {
        self.messages
            .iter()
            .map(|message| {
                format!(
                    "{}: {}",
                    message.role().as_str().to_uppercase(),
                    message.content()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Writes [`export_text`](Self::export_text) as a plain-text file.
    ///
    /// When `path` is an existing directory the file is named [`TRANSCRIPT_FILENAME`] inside
    /// it.  Returns the path written.
    pub fn write_text<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        let path = if path.is_dir() {
            path.join(TRANSCRIPT_FILENAME)
        } else {
            path.to_path_buf()
        };
        fs::write(&path, self.export_text()).map_err(|err| {
            Error::io(
                format!("failed to write transcript to {}", path.display()),
                err,
            )
        })?;
        Ok(path)
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
