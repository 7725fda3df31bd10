use serde::{Deserialize, Serialize};

use crate::types::ChatRole;

/// One conversation turn: a role and its text.
///
/// Messages are immutable once built; the fields are only reachable through accessors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    role: ChatRole,
    content: String,
}

impl ChatMessage {
    /// Create a new `ChatMessage` with the given role and content.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// The author of this message.
    pub fn role(&self) -> ChatRole {
        self.role
    }

    /// The text of this message.
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl From<&str> for ChatMessage {
    fn from(content: &str) -> Self {
        Self::user(content)
    }
}

impl From<String> for ChatMessage {
    fn from(content: String) -> Self {
        Self::user(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn wire_shape() {
        let message = ChatMessage::user("Hello there");
        assert_eq!(
            to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": "Hello there"
            })
        );
    }

    #[test]
    fn constructors_set_role() {
        assert_eq!(ChatMessage::system("be brief").role(), ChatRole::System);
        assert_eq!(ChatMessage::assistant("ok").role(), ChatRole::Assistant);
        let message: ChatMessage = "hi".into();
        assert_eq!(message.role(), ChatRole::User);
        assert_eq!(message.content(), "hi");
    }
}
