//! Minimal chat front end: fixed settings, streaming replies and `/clear`.
//!
//! ```bash
//! colloquy-simple
//! colloquy-simple --base-url http://localhost:8080/v1/
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use colloquy::OpenAI;
use colloquy::chat::{
    ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, SimpleArgs,
    load_env_file, parse_command, simple_help_text,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let (args, _) = SimpleArgs::from_command_line_relaxed("colloquy-simple [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let client = OpenAI::with_options(None, config.base_url.clone(), None)?;
    let mut session = ChatSession::new(client, config);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("Colloquy (model: {})", session.model());
    println!("Type /clear to start over, /quit to exit\n");

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
                        ChatCommand::Help => {
                            for line in simple_help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                        _ => {
                            renderer.print_error("Only /clear, /help and /quit are available here.");
                        }
                    }
                    continue;
                }

                println!("Assistant:");
                let _ = session.submit(line, &mut renderer).await;
                println!("    ({} messages)", session.message_count());
                if interrupted.load(Ordering::Relaxed) {
                    renderer.print_info("(interrupt ignored while the reply was streaming)");
                }
            }
            Err(ReadlineError::Interrupted) => {
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
