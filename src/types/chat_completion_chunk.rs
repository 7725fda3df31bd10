use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{ChatRole, FinishReason, Model};

/// One server-sent event of a streamed completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Identifier shared by every chunk of one completion.
    pub id: String,

    /// Always `chat.completion.chunk` for the OpenAI API.
    #[serde(default)]
    pub object: String,

    /// When the completion was created.
    #[serde(with = "crate::utils::time")]
    pub created: OffsetDateTime,

    /// The model that produced the chunk.
    pub model: Model,

    /// Per-choice deltas.  Chat sessions only request one choice.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// The delta for one choice within a chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Index of the choice this delta extends.
    #[serde(default)]
    pub index: u32,

    /// Newly generated content.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Set on the final chunk of the choice.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Incremental message content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkDelta {
    /// Present on the first chunk only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ChatRole>,

    /// The next fragment of text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// A single-choice chunk carrying `text`, for services that synthesize their replies.
    pub fn from_text(model: impl Into<Model>, text: impl Into<String>) -> Self {
        Self::single(
            model.into(),
            ChunkDelta {
                role: None,
                content: Some(text.into()),
            },
            None,
        )
    }

    /// A single-choice chunk that ends the reply for `reason`.
    pub fn finished(model: impl Into<Model>, reason: FinishReason) -> Self {
        Self::single(model.into(), ChunkDelta::default(), Some(reason))
    }

    fn single(model: Model, delta: ChunkDelta, finish_reason: Option<FinishReason>) -> Self {
        Self {
            id: String::new(),
            object: "chat.completion.chunk".to_string(),
            created: OffsetDateTime::now_utc(),
            model,
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }

    /// The text fragment carried by the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }

    /// The finish reason carried by the first choice, if any.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn parse_first_chunk() {
        let json = r#"{"id":"chatcmpl-1","object":"chat.completion.chunk","created":1700000000,"model":"gpt-3.5-turbo","choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.model, Model::Known(KnownModel::Gpt35Turbo));
        assert_eq!(chunk.choices[0].delta.role, Some(ChatRole::Assistant));
        assert_eq!(chunk.text(), Some(""));
        assert_eq!(chunk.finish_reason(), None);
    }

    #[test]
    fn parse_final_chunk() {
        let json = r#"{"id":"chatcmpl-1","object":"chat.completion.chunk","created":1700000000,"model":"gpt-4","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.text(), None);
        assert_eq!(chunk.finish_reason(), Some(FinishReason::Stop));
    }

    #[test]
    fn synthesized_chunks() {
        let chunk = ChatCompletionChunk::from_text(KnownModel::Gpt4, "hi");
        assert_eq!(chunk.text(), Some("hi"));
        assert_eq!(chunk.finish_reason(), None);
        let chunk = ChatCompletionChunk::finished("local-model", FinishReason::Length);
        assert_eq!(chunk.text(), None);
        assert_eq!(chunk.model, Model::Custom("local-model".to_string()));
        assert_eq!(chunk.finish_reason(), Some(FinishReason::Length));
    }

    #[test]
    fn empty_choices() {
        let json = r#"{"id":"x","created":1700000000,"model":"gpt-4","choices":[]}"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.text(), None);
        assert_eq!(chunk.finish_reason(), None);
    }
}
