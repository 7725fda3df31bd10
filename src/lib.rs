// Public modules
pub mod accumulating_stream;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod completion;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;
pub mod utils;

// Re-exports
pub use accumulating_stream::{AccumulatedReply, AccumulatingStream};
pub use client::OpenAI;
pub use client_logger::ClientLogger;
pub use completion::{Completion, CompletionService};
pub use error::{CREDENTIAL_HINT, Error, Result};
pub use observability::register_biometrics;
pub use render::{CURSOR_MARKER, PlainTextRenderer, Renderer};
pub use types::*;
