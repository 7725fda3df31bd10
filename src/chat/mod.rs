//! Chat application module for interactive conversations with an OpenAI-compatible service.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! colloquy client library. It supports:
//!
//! - Streaming responses with a live cursor marker
//! - Slash commands for session control
//! - Configurable model, temperature and system prompt
//! - Plain-text transcript download
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Core chat session management and completion requests
//! - [`commands`]: Slash command parsing and handling
//! - [`transcript`]: The ordered record of a conversation

pub mod commands;
pub mod config;
pub mod session;
pub mod transcript;

pub use crate::render::{CURSOR_MARKER, PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command, simple_help_text};
pub use config::{
    ChatArgs, ChatArgsError, ChatConfig, SimpleArgs, load_env_file, load_env_file_from,
    model_choices,
};
pub use session::{ChatSession, SessionState, SessionStats, TRUNCATED_NOTICE};
pub use transcript::{TRANSCRIPT_FILENAME, Transcript};
