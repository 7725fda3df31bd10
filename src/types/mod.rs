// Public modules
pub mod chat_completion;
pub mod chat_completion_chunk;
pub mod chat_completion_params;
pub mod chat_message;
pub mod chat_role;
pub mod finish_reason;
pub mod model;
pub mod temperature;
pub mod usage;

// Re-exports
pub use chat_completion::{ChatCompletion, CompletionChoice};
pub use chat_completion_chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta};
pub use chat_completion_params::ChatCompletionParams;
pub use chat_message::ChatMessage;
pub use chat_role::{ChatRole, ChatRoleParseError};
pub use finish_reason::FinishReason;
pub use model::{KnownModel, Model, ModelParseError};
pub use temperature::Temperature;
pub use usage::Usage;
