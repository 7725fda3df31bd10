//! The seam between a chat session and whatever produces completions.

use futures::{Stream, StreamExt};
use tokio::sync::oneshot;

use crate::accumulating_stream::{AccumulatedReply, AccumulatingStream};
use crate::{ChatCompletionChunk, ChatCompletionParams, Error, Result};

/// One streamed reply in progress.
///
/// Text fragments are pulled with [`next_fragment`](Completion::next_fragment) until it
/// returns `None`; [`finish`](Completion::finish) then yields the reply they add up to.  The
/// stream is finite and cannot be restarted.  An `Err` fragment means the completion failed
/// and no further fragments follow it.
pub struct Completion {
    fragments: AccumulatingStream,
    reply: oneshot::Receiver<Result<AccumulatedReply>>,
}

impl Completion {
    /// Pairs an accumulating stream with the receiver `AccumulatingStream::new` returned.
    pub fn new(
        fragments: AccumulatingStream,
        reply: oneshot::Receiver<Result<AccumulatedReply>>,
    ) -> Self {
        Self { fragments, reply }
    }

    /// Streams the text of `chunks`.
    pub fn from_chunks<S>(chunks: S) -> Self
    where
        S: Stream<Item = Result<ChatCompletionChunk>> + Send + 'static,
    {
        let (fragments, reply) = AccumulatingStream::new(chunks);
        Self::new(fragments, reply)
    }

    /// The next non-empty text fragment, or `None` once the reply is complete.
    pub async fn next_fragment(&mut self) -> Option<Result<String>> {
        self.fragments.next().await
    }

    /// Every fragment received so far, concatenated.
    pub fn partial(&self) -> &str {
        self.fragments.partial()
    }

    /// The complete reply.
    ///
    /// # Errors
    ///
    /// Returns the stream's error if it failed, or a streaming error if it was abandoned
    /// before the last fragment.
    pub async fn finish(self) -> Result<AccumulatedReply> {
        let Completion { fragments, reply } = self;
        drop(fragments);
        reply
            .await
            .map_err(|_| Error::streaming("completion abandoned before it finished", None))?
    }
}

/// A service that completes conversations incrementally.
///
/// [`OpenAI`](crate::OpenAI) implements this over HTTP.  Chat sessions depend only on this
/// trait, so tests and alternative back ends can substitute their own.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Starts a streamed completion of `params`.
    ///
    /// Failures that happen before the first fragment (missing credential, rejected request,
    /// unreachable host) are returned directly; later ones arrive through the completion.
    async fn stream_completion(&self, params: ChatCompletionParams) -> Result<Completion>;
}
