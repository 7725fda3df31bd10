//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns one conversation's transcript
//! and settings and drives streamed replies from a [`CompletionService`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::accumulating_stream::AccumulatedReply;
use crate::chat::config::ChatConfig;
use crate::chat::transcript::Transcript;
use crate::completion::CompletionService;
use crate::error::{CREDENTIAL_HINT, Error, Result};
use crate::observability::{SESSION_TURN_DURATION, SESSION_TURN_ERRORS, SESSION_TURNS};
use crate::render::{CURSOR_MARKER, Renderer};
use crate::types::{ChatCompletionParams, ChatMessage, FinishReason, Model, Temperature};

/// Shown after a reply the service stopped at its token limit.
pub const TRUNCATED_NOTICE: &str = "(reply cut short at the token limit)";

/// Where a session is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for input.
    Idle,
    /// A reply is being streamed.
    Streaming,
}

/// A chat session that manages conversation state and completion requests.
///
/// The session owns its transcript outright; two sessions never share one.
///
/// ```
/// # tokio_test::block_on(async {
/// use colloquy::OpenAI;
/// use colloquy::chat::{ChatConfig, ChatSession, PlainTextRenderer};
///
/// let client = OpenAI::new(Some(String::new())).unwrap();
/// let mut session = ChatSession::new(client, ChatConfig::new());
/// let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
///
/// // No credential: the request fails, the question stays.
/// assert!(session.submit("Hello?", &mut renderer).await.is_err());
/// assert_eq!(session.message_count(), 1);
/// # });
/// ```
pub struct ChatSession<S: CompletionService> {
    service: S,
    config: ChatConfig,
    transcript: Transcript,
    state: SessionState,
    total_requests: u64,
    failed_requests: u64,
    truncated_replies: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: Model,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// The sampling temperature, if set.
    pub temperature: Option<Temperature>,
    /// The system prompt, if any.
    pub system_prompt: Option<String>,
    /// Total number of completion requests made.
    pub total_requests: u64,
    /// Requests that did not produce a reply.
    pub failed_requests: u64,
    /// Replies stopped by the token limit.
    pub truncated_replies: u64,
}

impl<S: CompletionService> ChatSession<S> {
    /// Creates a new chat session with the given service and configuration.
    pub fn new(service: S, config: ChatConfig) -> Self {
        Self {
            service,
            config,
            transcript: Transcript::new(),
            state: SessionState::Idle,
            total_requests: 0,
            failed_requests: 0,
            truncated_replies: 0,
        }
    }

    /// Sends a user message and streams the reply.
    ///
    /// This method:
    /// 1. Adds the user message to the transcript
    /// 2. Sends the system prompt (if any) and the transcript as a streaming request
    /// 3. Renders the growing reply, cursor marker included, as fragments arrive
    /// 4. Adds the complete assistant reply to the transcript, noting when the token limit
    ///    cut it short
    ///
    /// # Errors
    ///
    /// Blank input is rejected with a validation error before anything changes.  Any other
    /// error has already been shown through `renderer` when it is returned; the user message
    /// stays in the transcript with no reply after it.
    pub async fn submit(&mut self, user_text: &str, renderer: &mut dyn Renderer) -> Result<()> {
        if user_text.trim().is_empty() {
            return Err(Error::validation(
                "message must not be empty",
                Some("content".to_string()),
            ));
        }

        self.transcript.push_user(user_text);
        self.state = SessionState::Streaming;
        self.total_requests += 1;
        SESSION_TURNS.click();
        let start = Instant::now();

        let params = ChatCompletionParams::new(self.config.model.clone(), self.outbound_messages())
            .with_temperature(self.config.temperature)
            .streaming();
        let outcome = self.stream_reply(params, renderer).await;

        SESSION_TURN_DURATION.add(start.elapsed().as_secs_f64());
        self.state = SessionState::Idle;
        match outcome {
            Ok(reply) => {
                if reply.finish_reason.as_ref().is_some_and(FinishReason::is_truncated) {
                    self.truncated_replies += 1;
                    renderer.print_info(TRUNCATED_NOTICE);
                }
                self.transcript.push_assistant(reply.content);
                Ok(())
            }
            Err(err) => {
                SESSION_TURN_ERRORS.click();
                self.failed_requests += 1;
                renderer.print_error(&err.to_string());
                renderer.print_info(CREDENTIAL_HINT);
                Err(err)
            }
        }
    }

    async fn stream_reply(
        &self,
        params: ChatCompletionParams,
        renderer: &mut dyn Renderer,
    ) -> Result<AccumulatedReply> {
        let mut completion = self.service.stream_completion(params).await?;
        renderer.start_response();
        while let Some(fragment) = completion.next_fragment().await {
            if let Err(err) = fragment {
                renderer.abandon_response();
                return Err(err);
            }
            renderer.print_partial(&format!("{}{CURSOR_MARKER}", completion.partial()));
        }
        match completion.finish().await {
            Ok(reply) => {
                renderer.finish_response(&reply.content);
                Ok(reply)
            }
            Err(err) => {
                renderer.abandon_response();
                Err(err)
            }
        }
    }

    /// The messages the next request would carry: the system prompt, if any, followed by the
    /// transcript in order.
    pub fn outbound_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        if let Some(prompt) = self.system_prompt() {
            messages.push(ChatMessage::system(prompt));
        }
        messages.extend(self.transcript.messages().iter().cloned());
        messages
    }

    /// Clears the conversation history.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Renders the transcript as plain text.
    pub fn export_text(&self) -> String {
        self.transcript.export_text()
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    /// Writes the plain-text transcript to `path`, returning the file written.
    ///
    /// A directory gets a `chat_history.txt` inside it.
    pub fn download_transcript<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        self.transcript.write_text(path)
    }

    /// Changes the model used for responses.
    pub fn set_model(&mut self, model: impl Into<Model>) {
        self.config.model = model.into();
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        &self.config.model
    }

    /// Sets the sampling temperature.
    ///
    /// # Errors
    ///
    /// Values outside `[0.0, 2.0]` are rejected and the current temperature is kept.
    pub fn set_temperature(&mut self, temperature: f32) -> Result<()> {
        self.config.temperature = Some(Temperature::new(temperature)?);
        Ok(())
    }

    /// Leaves the temperature to the service.
    pub fn clear_temperature(&mut self) {
        self.config.temperature = None;
    }

    /// Returns the sampling temperature, if set.
    pub fn temperature(&self) -> Option<Temperature> {
        self.config.temperature
    }

    /// Sets or clears the system prompt.  A blank prompt clears it.
    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.config.system_prompt = prompt.filter(|p| !p.trim().is_empty());
    }

    /// Returns the current system prompt, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.config.system_prompt.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model.clone(),
            message_count: self.message_count(),
            temperature: self.config.temperature,
            system_prompt: self.config.system_prompt.clone(),
            total_requests: self.total_requests,
            failed_requests: self.failed_requests,
            truncated_replies: self.truncated_replies,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use futures::stream;

    use super::*;
    use crate::completion::Completion;
    use crate::types::{ChatCompletionChunk, ChatRole, KnownModel};

    enum Script {
        Reply(Vec<&'static str>),
        Finish(Vec<&'static str>, FinishReason),
        FailBeforeStream(Error),
        FailMidStream(Vec<&'static str>, Error),
    }

    fn text_chunks(fragments: Vec<&'static str>) -> Vec<Result<ChatCompletionChunk>> {
        fragments
            .into_iter()
            .map(|f| Ok(ChatCompletionChunk::from_text(KnownModel::Gpt35Turbo, f)))
            .collect()
    }

    fn finished(reason: FinishReason) -> Result<ChatCompletionChunk> {
        Ok(ChatCompletionChunk::finished(KnownModel::Gpt35Turbo, reason))
    }

    #[derive(Default)]
    struct ScriptedService {
        scripts: Mutex<VecDeque<Script>>,
        requests: Mutex<Vec<ChatCompletionParams>>,
    }

    impl ScriptedService {
        fn new(scripts: Vec<Script>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn replying(n: usize) -> Self {
            Self::new((0..n).map(|_| Script::Reply(vec!["Hel", "lo"])).collect())
        }

        fn requests(&self) -> Vec<ChatCompletionParams> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CompletionService for ScriptedService {
        async fn stream_completion(&self, params: ChatCompletionParams) -> Result<Completion> {
            self.requests.lock().unwrap().push(params);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted reply left");
            let (fragments, end) = match script {
                Script::Reply(fragments) => (fragments, finished(FinishReason::Stop)),
                Script::Finish(fragments, reason) => (fragments, finished(reason)),
                Script::FailBeforeStream(err) => return Err(err),
                Script::FailMidStream(fragments, err) => (fragments, Err(err)),
            };
            let mut chunks = text_chunks(fragments);
            chunks.push(end);
            Ok(Completion::from_chunks(stream::iter(chunks)))
        }
    }

    #[derive(Debug, Default)]
    struct RecordingRenderer {
        partials: Vec<String>,
        finished: Vec<String>,
        abandoned: usize,
        errors: Vec<String>,
        infos: Vec<String>,
    }

    impl Renderer for RecordingRenderer {
        fn print_partial(&mut self, partial: &str) {
            self.partials.push(partial.to_string());
        }

        fn finish_response(&mut self, text: &str) {
            self.finished.push(text.to_string());
        }

        fn abandon_response(&mut self) {
            self.abandoned += 1;
        }

        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }

        fn print_info(&mut self, info: &str) {
            self.infos.push(info.to_string());
        }

        fn print_message(&mut self, _: &ChatMessage) {}
    }

    fn session(service: ScriptedService) -> ChatSession<ScriptedService> {
        ChatSession::new(service, ChatConfig::new())
    }

    #[test]
    fn new_session_empty() {
        let session = session(ScriptedService::default());
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.export_text(), "");
    }

    #[tokio::test]
    async fn submit_streams_and_records_reply() {
        let mut session = session(ScriptedService::replying(1));
        let mut renderer = RecordingRenderer::default();
        session.submit("hi", &mut renderer).await.unwrap();

        assert_eq!(renderer.partials, vec!["Hel▌", "Hello▌"]);
        assert_eq!(renderer.finished, vec!["Hello"]);
        assert!(renderer.errors.is_empty());
        assert_eq!(session.export_text(), "USER: hi\n\nASSISTANT: Hello");
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn n_submissions_give_2n_alternating_messages() {
        let n = 4;
        let mut session = session(ScriptedService::replying(n));
        let mut renderer = RecordingRenderer::default();
        for i in 0..n {
            session
                .submit(&format!("question {i}"), &mut renderer)
                .await
                .unwrap();
        }
        assert_eq!(session.message_count(), 2 * n);
        for (i, message) in session.transcript().messages().iter().enumerate() {
            let expected = if i % 2 == 0 {
                ChatRole::User
            } else {
                ChatRole::Assistant
            };
            assert_eq!(message.role(), expected);
        }
    }

    #[tokio::test]
    async fn request_carries_settings_and_full_transcript() {
        let service = ScriptedService::replying(2);
        let mut session = session(service);
        let mut renderer = RecordingRenderer::default();
        session.set_model(KnownModel::Gpt4);
        session.set_temperature(1.5).unwrap();
        session.submit("one", &mut renderer).await.unwrap();
        session.submit("two", &mut renderer).await.unwrap();

        let requests = session.service.requests();
        assert_eq!(requests.len(), 2);
        let last = &requests[1];
        assert_eq!(last.model, Model::Known(KnownModel::Gpt4));
        assert_eq!(last.temperature, Some(Temperature::new(1.5).unwrap()));
        assert!(last.stream);
        let contents: Vec<_> = last.messages.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["one", "Hello", "two"]);
    }

    #[test]
    fn system_prompt_prefixes_outbound_messages() {
        let mut session = session(ScriptedService::default());
        session.transcript.push_user("hi");
        session.transcript.push_assistant("hello");
        assert_eq!(session.outbound_messages().len(), 2);

        session.set_system_prompt(Some("Be terse".to_string()));
        let outbound = session.outbound_messages();
        assert_eq!(outbound.len(), session.message_count() + 1);
        assert_eq!(outbound[0], ChatMessage::system("Be terse"));
        assert_eq!(&outbound[1..], session.transcript().messages());

        session.set_system_prompt(Some("   ".to_string()));
        assert!(session.system_prompt().is_none());
        assert_eq!(session.outbound_messages().len(), 2);
    }

    #[tokio::test]
    async fn failure_before_stream_keeps_user_message() {
        let service = ScriptedService::new(vec![Script::FailBeforeStream(
            Error::authentication("missing API key"),
        )]);
        let mut session = session(service);
        let mut renderer = RecordingRenderer::default();
        let err = session.submit("test", &mut renderer).await.unwrap_err();

        assert!(err.is_authentication());
        assert_eq!(session.transcript().messages(), &[ChatMessage::user("test")]);
        assert_eq!(renderer.errors.len(), 1);
        assert!(renderer.errors[0].contains("missing API key"));
        assert_eq!(renderer.infos, vec![CREDENTIAL_HINT]);
        assert_eq!(renderer.abandoned, 0);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.stats().failed_requests, 1);
    }

    #[tokio::test]
    async fn failure_mid_stream_discards_partial_reply() {
        let service = ScriptedService::new(vec![Script::FailMidStream(
            vec!["Par", "tial"],
            Error::streaming("connection reset", None),
        )]);
        let mut session = session(service);
        let mut renderer = RecordingRenderer::default();
        assert!(session.submit("test", &mut renderer).await.is_err());

        assert_eq!(renderer.partials, vec!["Par▌", "Partial▌"]);
        assert!(renderer.finished.is_empty());
        assert_eq!(renderer.abandoned, 1);
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.transcript().last(), Some(&ChatMessage::user("test")));
    }

    #[tokio::test]
    async fn failure_before_first_fragment_still_closes_the_reply() {
        let service = ScriptedService::new(vec![Script::FailMidStream(
            vec![],
            Error::streaming("connection reset", None),
        )]);
        let mut session = session(service);
        let mut renderer = RecordingRenderer::default();
        assert!(session.submit("test", &mut renderer).await.is_err());

        assert!(renderer.partials.is_empty());
        assert!(renderer.finished.is_empty());
        assert_eq!(renderer.abandoned, 1);
        assert_eq!(renderer.errors.len(), 1);
        assert_eq!(session.message_count(), 1);
    }

    #[tokio::test]
    async fn truncated_reply_is_kept_and_noted() {
        let service = ScriptedService::new(vec![Script::Finish(
            vec!["Once upon", " a time"],
            FinishReason::Length,
        )]);
        let mut session = session(service);
        let mut renderer = RecordingRenderer::default();
        session.submit("tell me a story", &mut renderer).await.unwrap();

        assert_eq!(renderer.finished, vec!["Once upon a time"]);
        assert_eq!(renderer.infos, vec![TRUNCATED_NOTICE]);
        assert_eq!(
            session.transcript().last(),
            Some(&ChatMessage::assistant("Once upon a time"))
        );
        let stats = session.stats();
        assert_eq!(stats.truncated_replies, 1);
        assert_eq!(stats.failed_requests, 0);
    }

    #[tokio::test]
    async fn unrecognized_finish_reason_completes_the_turn() {
        let service = ScriptedService::new(vec![Script::Finish(
            vec!["Hello"],
            FinishReason::Other("eos".to_string()),
        )]);
        let mut session = session(service);
        let mut renderer = RecordingRenderer::default();
        session.submit("hi", &mut renderer).await.unwrap();

        assert_eq!(session.export_text(), "USER: hi\n\nASSISTANT: Hello");
        assert!(renderer.infos.is_empty());
        assert_eq!(session.stats().truncated_replies, 0);
    }

    #[tokio::test]
    async fn session_recovers_after_failure() {
        let service = ScriptedService::new(vec![
            Script::FailBeforeStream(Error::rate_limit("slow down", Some(1))),
            Script::Reply(vec!["ok"]),
        ]);
        let mut session = session(service);
        let mut renderer = RecordingRenderer::default();
        assert!(session.submit("first", &mut renderer).await.is_err());
        session.submit("second", &mut renderer).await.unwrap();

        let roles: Vec<_> = session
            .transcript()
            .messages()
            .iter()
            .map(|m| m.role())
            .collect();
        assert_eq!(
            roles,
            vec![ChatRole::User, ChatRole::User, ChatRole::Assistant]
        );
        let stats = session.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.message_count, 3);
    }

    #[tokio::test]
    async fn blank_input_is_rejected_without_mutation() {
        let mut session = session(ScriptedService::default());
        let mut renderer = RecordingRenderer::default();
        let err = session.submit("  \n", &mut renderer).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.message_count(), 0);
        assert!(session.service.requests().is_empty());
        assert!(renderer.errors.is_empty());
    }

    #[tokio::test]
    async fn clear_empties_transcript() {
        let mut session = session(ScriptedService::replying(1));
        let mut renderer = RecordingRenderer::default();
        session.submit("hi", &mut renderer).await.unwrap();
        session.clear();
        assert_eq!(session.message_count(), 0);
        session.clear();
        assert_eq!(session.message_count(), 0);
    }

    #[test]
    fn temperature_bounds() {
        let mut session = session(ScriptedService::default());
        assert!(session.set_temperature(0.0).is_ok());
        assert_eq!(session.temperature().map(|t| t.value()), Some(0.0));
        assert!(session.set_temperature(2.0).is_ok());
        assert_eq!(session.temperature().map(|t| t.value()), Some(2.0));

        for bad in [-0.1, 2.1, f32::NAN] {
            assert!(session.set_temperature(bad).unwrap_err().is_validation());
            assert_eq!(session.temperature().map(|t| t.value()), Some(2.0));
        }

        session.clear_temperature();
        assert!(session.temperature().is_none());
    }

    #[test]
    fn set_model() {
        let mut session = session(ScriptedService::default());
        assert_eq!(session.model(), &Model::Known(KnownModel::Gpt35Turbo));
        session.set_model(KnownModel::Gpt4TurboPreview);
        assert_eq!(session.model(), &Model::Known(KnownModel::Gpt4TurboPreview));
        assert_eq!(session.stats().model, Model::Known(KnownModel::Gpt4TurboPreview));
    }

    #[tokio::test]
    async fn download_writes_export_text() {
        let mut session = session(ScriptedService::replying(1));
        let mut renderer = RecordingRenderer::default();
        session.submit("hi", &mut renderer).await.unwrap();

        let dir = std::env::temp_dir().join(format!("colloquy-session-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = session.download_transcript(&dir).unwrap();
        assert_eq!(path, dir.join("chat_history.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), session.export_text());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
