use serde::{Deserialize, Serialize};

/// Token accounting reported with a completion.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Tokens in the prompt (all request messages).
    pub prompt_tokens: u32,

    /// Tokens generated in the completion.
    pub completion_tokens: u32,

    /// Sum of prompt and completion tokens.
    pub total_tokens: u32,
}

impl Usage {
    /// Create a new `Usage`; the total is derived.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}
