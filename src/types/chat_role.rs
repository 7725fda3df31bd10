use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The author of a chat message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Operator instructions that steer the completion service.
    System,

    /// The human side of the conversation.
    User,

    /// The model's replies.
    Assistant,
}

impl ChatRole {
    /// The wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an invalid role string.
#[derive(Debug)]
pub struct ChatRoleParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for ChatRoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown chat role: {}", self.invalid_value)
    }
}

impl std::error::Error for ChatRoleParseError {}

impl FromStr for ChatRole {
    type Err = ChatRoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(ChatRole::System),
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            _ => Err(ChatRoleParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            r#""assistant""#
        );
        let role: ChatRole = serde_json::from_str(r#""system""#).unwrap();
        assert_eq!(role, ChatRole::System);
    }

    #[test]
    fn parse_and_display_agree() {
        for role in [ChatRole::System, ChatRole::User, ChatRole::Assistant] {
            assert_eq!(role.to_string().parse::<ChatRole>().unwrap(), role);
        }
        assert!("narrator".parse::<ChatRole>().is_err());
    }
}
