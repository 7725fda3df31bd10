//! Slash command parsing for the chat front ends.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the completion service.

use crate::types::{KnownModel, Temperature};

use super::config::model_choices;

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// Write the transcript as plain text.
    /// `None` writes `chat_history.txt` in the working directory.
    Download(Option<String>),

    /// Change the model.
    Model(KnownModel),

    /// List the models that can be chosen.
    ListModels,

    /// Set the sampling temperature.
    Temperature(f32),

    /// Set or clear the system prompt.
    /// `None` clears the current system prompt.
    System(Option<String>),

    /// Re-display the conversation so far.
    History,

    /// Display session statistics (message count, current model, etc.).
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use colloquy::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model gpt-4").is_some());
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "download" | "save" => ChatCommand::Download(argument.map(|s| s.to_string())),
        "model" => match argument {
            Some(name) => match name.parse::<KnownModel>() {
                Ok(model) => ChatCommand::Model(model),
                Err(_) => ChatCommand::Invalid(format!(
                    "Unknown model: {name} (choose one of {})",
                    model_choices()
                )),
            },
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "models" => ChatCommand::ListModels,
        "temperature" | "temp" => match argument {
            Some(arg) => match parse_f32_in_range(arg, Temperature::MIN, Temperature::MAX) {
                Ok(value) => ChatCommand::Temperature(value),
                Err(err) => ChatCommand::Invalid(format!("/temperature {err}")),
            },
            None => ChatCommand::Invalid("/temperature requires a value".to_string()),
        },
        "system" => ChatCommand::System(argument.map(|s| s.to_string())),
        "history" => ChatCommand::History,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_f32_in_range(value: &str, min: f32, max: f32) -> Result<f32, String> {
    let parsed: f32 = value
        .parse()
        .map_err(|_| format!("expects a value between {min} and {max}"))?;
    if parsed.is_finite() && parsed >= min && parsed <= max {
        Ok(parsed)
    } else {
        Err(format!("expects a value between {min} and {max}"))
    }
}

/// Returns help text describing the commands of colloquy-chat.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear conversation history
  /download [file]       Save the conversation as text (default: chat_history.txt)
  /model <name>          Change the model (e.g., /model gpt-4)
  /models                List available models
  /temperature <v>       Set temperature 0.0-2.0
  /system [prompt]       Set system prompt (no argument clears it)
  /history               Show the conversation so far
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}

/// Returns help text describing the commands of colloquy-simple.
pub fn simple_help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear conversation history
  /help                  Show this help message
  /quit                  Exit the chat"#
}
