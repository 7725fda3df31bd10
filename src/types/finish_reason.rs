use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reasons why the model stopped generating a completion.
///
/// Servers that only imitate the OpenAI API report reasons of their own (`eos`, `abort`, ...);
/// those deserialize to [`FinishReason::Other`] rather than failing the chunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FinishReason {
    /// The model reached a natural stopping point or a stop sequence
    Stop,

    /// The completion hit the token limit
    Length,

    /// Content was omitted by the provider's content filter
    ContentFilter,

    /// The model asked to call tools
    ToolCalls,

    /// The model asked to call a function (legacy)
    FunctionCall,

    /// Any reason not listed above, verbatim
    Other(String),
}

impl FinishReason {
    /// The identifier used on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::FunctionCall => "function_call",
            FinishReason::Other(other) => other,
        }
    }

    /// True when the reply was cut short by the token limit.
    pub fn is_truncated(&self) -> bool {
        matches!(self, FinishReason::Length)
    }
}

impl From<&str> for FinishReason {
    fn from(s: &str) -> Self {
        match s {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            "tool_calls" => FinishReason::ToolCalls,
            "function_call" => FinishReason::FunctionCall,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FinishReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FinishReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FinishReason::from(s.as_str()))
    }
}
