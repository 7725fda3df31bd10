use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{ChatMessage, FinishReason, Model, Usage};

/// A complete, non-streamed completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletion {
    /// Unique identifier of the completion.
    pub id: String,

    /// Always `chat.completion` for the OpenAI API.
    #[serde(default)]
    pub object: String,

    /// When the completion was created.
    #[serde(with = "crate::utils::time")]
    pub created: OffsetDateTime,

    /// The model that produced the completion.
    pub model: Model,

    /// The generated choices.
    pub choices: Vec<CompletionChoice>,

    /// Token accounting, when the service reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// One generated reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionChoice {
    /// Position of this choice.
    #[serde(default)]
    pub index: u32,

    /// The assistant message.
    pub message: ChatMessage,

    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

impl ChatCompletion {
    /// The text of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|choice| choice.message.content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatRole;

    #[test]
    fn parse_completion() {
        let json = r#"{
            "id": "chatcmpl-9",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
        }"#;
        let completion: ChatCompletion = serde_json::from_str(json).unwrap();
        assert_eq!(completion.text(), Some("Hello!"));
        assert_eq!(completion.choices[0].message.role(), ChatRole::Assistant);
        assert_eq!(completion.choices[0].finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage, Some(Usage::new(9, 3)));
    }
}
