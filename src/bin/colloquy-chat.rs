//! Interactive chat application for OpenAI-compatible completion services.
//!
//! This binary provides a streaming REPL interface with adjustable model,
//! temperature and system prompt.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! colloquy-chat
//!
//! # Specify a model and temperature
//! colloquy-chat --model gpt-4 --temperature 0.2
//!
//! # Set a system prompt
//! colloquy-chat --system "You are a helpful coding assistant"
//!
//! # Disable colors (useful for piping output)
//! colloquy-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/download [file]` - Save the conversation as text
//! - `/model <name>` - Change the model
//! - `/temperature <v>` - Set the temperature
//! - `/system [prompt]` - Set or clear system prompt
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use colloquy::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    load_env_file, parse_command,
};
use colloquy::{KnownModel, Model, OpenAI};

/// Main entry point for the colloquy-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let (args, _) = ChatArgs::from_command_line_relaxed("colloquy-chat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;
    let use_color = config.use_color;

    let client = OpenAI::with_options(None, config.base_url.clone(), None)?;
    let mut session = ChatSession::new(client, config);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Replies cannot be cancelled; Ctrl+C while streaming is noted and otherwise ignored.
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("Colloquy Chat (model: {})", session.model());
    println!("Type /help for commands, /quit to exit\n");

    loop {
        interrupted.store(false, Ordering::Relaxed);

        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::Download(path) => {
                            let target = path.unwrap_or_else(|| ".".to_string());
                            match session.download_transcript(&target) {
                                Ok(written) => renderer.print_info(&format!(
                                    "Transcript saved to {}",
                                    written.display()
                                )),
                                Err(err) => renderer
                                    .print_error(&format!("Failed to save transcript: {}", err)),
                            }
                        }
                        ChatCommand::Model(model) => {
                            session.set_model(model);
                            renderer.print_info(&format!("Model changed to: {}", model));
                        }
                        ChatCommand::ListModels => {
                            println!("    Available models:");
                            for model in KnownModel::ALL {
                                let marker = if *session.model() == Model::Known(model) {
                                    "*"
                                } else {
                                    " "
                                };
                                println!("    {marker} {model}");
                            }
                        }
                        ChatCommand::Temperature(value) => match session.set_temperature(value) {
                            Ok(()) => {
                                renderer.print_info(&format!("temperature set to {:.1}", value))
                            }
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::System(prompt) => {
                            session.set_system_prompt(prompt);
                            match session.system_prompt() {
                                Some(p) => {
                                    renderer.print_info(&format!("System prompt set to: {}", p))
                                }
                                None => renderer.print_info("System prompt cleared."),
                            }
                        }
                        ChatCommand::History => {
                            if session.message_count() == 0 {
                                renderer.print_info("(no messages yet)");
                            }
                            for message in session.transcript() {
                                renderer.print_message(message);
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&session);
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                println!("Assistant:");
                // Errors are rendered by the session along with the credential hint.
                let _ = session.submit(line, &mut renderer).await;
                if interrupted.load(Ordering::Relaxed) {
                    renderer.print_info("(interrupt ignored while the reply was streaming)");
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_stats(session: &ChatSession<OpenAI>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", stats.model);
    println!("      Messages: {}", stats.message_count);
    println!("      Temperature: {}", describe_temperature(session));
    if let Some(prompt) = stats.system_prompt.as_deref() {
        println!("      System prompt: {}", prompt);
    } else {
        println!("      System prompt: (none)");
    }
    println!(
        "      Requests: {} ({} failed, {} truncated)",
        stats.total_requests, stats.failed_requests, stats.truncated_replies
    );
}

fn print_config(session: &ChatSession<OpenAI>) {
    let config = session.config();
    println!("    Current Configuration:");
    println!("      Model: {}", config.model);
    println!("      Temperature: {}", describe_temperature(session));
    if let Some(prompt) = config.system_prompt.as_deref() {
        println!("      System prompt: {}", prompt);
    } else {
        println!("      System prompt: (none)");
    }
    println!(
        "      API root: {}",
        config.base_url.as_deref().unwrap_or("(default)")
    );
    println!(
        "      Color: {}",
        if config.use_color {
            "enabled"
        } else {
            "disabled"
        }
    );
}

fn describe_temperature(session: &ChatSession<OpenAI>) -> String {
    session
        .temperature()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "default".to_string())
}
