//! Turns a stream of completion chunks into text fragments while accumulating the full reply.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;

use crate::{ChatCompletionChunk, ClientLogger, Error, FinishReason, Model};

/// The reply reconstructed from a fully drained stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatedReply {
    /// Every fragment concatenated in arrival order.
    pub content: String,
    /// The finish reason reported by the final chunk, if any.
    pub finish_reason: Option<FinishReason>,
    /// The model named by the chunks, if any arrived.
    pub model: Option<Model>,
    /// Number of chunks decoded, including those without text.
    pub chunk_count: usize,
}

/// A stream wrapper that yields the text of each `ChatCompletionChunk` and accumulates it.
///
/// This allows rendering fragments as they arrive while simultaneously building the final
/// reply without buffering.  When the stream is fully drained the accumulated reply is sent
/// via the oneshot channel returned by `new()`; if the inner stream fails, the error is sent
/// instead and the stream ends.
pub struct AccumulatingStream {
    inner: Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, Error>> + Send>>,
    reply_tx: Option<tokio::sync::oneshot::Sender<Result<AccumulatedReply, Error>>>,
    logger: Option<Arc<dyn ClientLogger>>,
    content: String,
    finish_reason: Option<FinishReason>,
    model: Option<Model>,
    chunk_count: usize,
    terminated: bool,
}

impl AccumulatingStream {
    /// Wraps a chunk stream to accumulate its text.
    ///
    /// Returns the stream and a receiver that will contain the accumulated reply once the
    /// stream is fully drained.
    pub fn new<S>(
        stream: S,
    ) -> (
        Self,
        tokio::sync::oneshot::Receiver<Result<AccumulatedReply, Error>>,
    )
    where
        S: Stream<Item = Result<ChatCompletionChunk, Error>> + Send + 'static,
    {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let this = Self {
            inner: Box::pin(stream),
            reply_tx: Some(tx),
            logger: None,
            content: String::new(),
            finish_reason: None,
            model: None,
            chunk_count: 0,
            terminated: false,
        };
        (this, rx)
    }

    /// Reports every chunk and the final reply to `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The text accumulated so far.
    pub fn partial(&self) -> &str {
        &self.content
    }

    fn accumulate_chunk(&mut self, chunk: &ChatCompletionChunk) -> Option<String> {
        self.chunk_count += 1;
        if let Some(logger) = &self.logger {
            logger.log_stream_chunk(chunk);
        }
        if self.model.is_none() {
            self.model = Some(chunk.model.clone());
        }
        if let Some(reason) = chunk.finish_reason() {
            self.finish_reason = Some(reason);
        }
        match chunk.text() {
            Some(text) if !text.is_empty() => {
                self.content.push_str(text);
                Some(text.to_string())
            }
            _ => None,
        }
    }

    fn finalize(&mut self) -> AccumulatedReply {
        if let Some(logger) = &self.logger {
            logger.log_stream_reply(&self.content);
        }
        AccumulatedReply {
            content: std::mem::take(&mut self.content),
            finish_reason: self.finish_reason.take(),
            model: self.model.take(),
            chunk_count: self.chunk_count,
        }
    }
}

impl Stream for AccumulatingStream {
    type Item = Result<String, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.terminated {
            return Poll::Ready(None);
        }
        loop {
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    if let Some(fragment) = self.accumulate_chunk(&chunk) {
                        return Poll::Ready(Some(Ok(fragment)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    self.terminated = true;
                    if let Some(tx) = self.reply_tx.take() {
                        let _ = tx.send(Err(e.clone()));
                    }
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    self.terminated = true;
                    if let Some(tx) = self.reply_tx.take() {
                        let reply = self.finalize();
                        let _ = tx.send(Ok(reply));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
