use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Model, Temperature};

/// Body of a `chat/completions` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionParams {
    /// The model that will complete the conversation.
    pub model: Model,

    /// The conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature; the service default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Temperature>,

    /// Upper bound on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Whether the reply is delivered incrementally as server-sent events.
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionParams {
    /// Create non-streaming parameters for `messages`.
    pub fn new(model: impl Into<Model>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            stream: false,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: impl Into<Option<Temperature>>) -> Self {
        self.temperature = temperature.into();
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Request incremental delivery.
    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;
    use serde_json::{json, to_value};

    #[test]
    fn minimal_request() {
        let params =
            ChatCompletionParams::new(KnownModel::Gpt35Turbo, vec![ChatMessage::user("hi")]);
        assert_eq!(
            to_value(&params).unwrap(),
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": false
            })
        );
    }

    #[test]
    fn full_request() {
        let params = ChatCompletionParams::new(
            KnownModel::Gpt4,
            vec![
                ChatMessage::system("You are terse."),
                ChatMessage::user("hi"),
            ],
        )
        .with_temperature(Temperature::new(1.5).unwrap())
        .with_max_tokens(256)
        .streaming();
        assert_eq!(
            to_value(&params).unwrap(),
            json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "You are terse."},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 1.5,
                "max_tokens": 256,
                "stream": true
            })
        );
    }
}
