//! Logging trait for completion client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`OpenAI`](crate::OpenAI) client.

use crate::{ChatCompletion, ChatCompletionChunk, ChatCompletionParams};

/// A trait for logging completion client operations.
///
/// Implement this trait to capture and record all API interactions,
/// including outbound requests, non-streaming responses and individual
/// streaming chunks.
///
/// # Example
///
/// ```rust,ignore
/// use colloquy::{ChatCompletion, ChatCompletionChunk, ChatCompletionParams, ClientLogger};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, params: &ChatCompletionParams) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Request: {}", serde_json::to_string(params).unwrap()).unwrap();
///     }
///
///     fn log_response(&self, completion: &ChatCompletion) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Response: {}", serde_json::to_string(completion).unwrap()).unwrap();
///     }
///
///     fn log_stream_chunk(&self, chunk: &ChatCompletionChunk) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Chunk: {}", serde_json::to_string(chunk).unwrap()).unwrap();
///     }
///
///     fn log_stream_reply(&self, reply: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Stream complete: {reply}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, params: &ChatCompletionParams);

    /// Log a complete response from a non-streaming `send` call.
    fn log_response(&self, completion: &ChatCompletion);

    /// Log an individual streaming chunk as it is decoded.
    fn log_stream_chunk(&self, chunk: &ChatCompletionChunk);

    /// Log the reply text reconstructed from a completed stream.
    ///
    /// Streams that fail part way never reach this method.
    fn log_stream_reply(&self, reply: &str);
}
