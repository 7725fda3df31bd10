//! Configuration types for the chat front ends.
//!
//! This module provides CLI argument parsing via `arrrg` and the session settings that
//! control every request: model, temperature and system prompt.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use arrrg_derive::CommandLine;

use crate::types::{KnownModel, Model, Temperature};

/// Command-line arguments for the colloquy-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gpt-3.5-turbo)", "MODEL")]
    pub model: Option<String>,

    /// System prompt to set context for the conversation.
    #[arrrg(optional, "System prompt for the conversation", "PROMPT")]
    pub system: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Temperature between 0.0 and 2.0 (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// Root of an OpenAI-compatible API.
    #[arrrg(optional, "API root (default: https://api.openai.com/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Command-line arguments for the colloquy-simple tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct SimpleArgs {
    /// Root of an OpenAI-compatible API.
    #[arrrg(optional, "API root (default: https://api.openai.com/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// A command-line value that cannot become a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatArgsError {
    /// The model is not one the chat front end offers.
    UnknownModel(String),
    /// The temperature is not a number in `[0.0, 2.0]`.
    InvalidTemperature(String),
}

impl fmt::Display for ChatArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatArgsError::UnknownModel(model) => {
                write!(f, "unknown model {model:?}; choose one of {}", model_choices())
            }
            ChatArgsError::InvalidTemperature(value) => write!(
                f,
                "temperature {value:?} must be a number between {} and {}",
                Temperature::MIN,
                Temperature::MAX
            ),
        }
    }
}

impl std::error::Error for ChatArgsError {}

/// Loads `.env` from the working directory or the nearest parent that has one.
///
/// Variables already set in the environment keep their values.  Returns the file that was
/// read, if any.
pub fn load_env_file() -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    load_env_file_from(&cwd)
}

/// Like [`load_env_file`], searching upward from `start` instead of the working directory.
pub fn load_env_file_from(start: &Path) -> Option<PathBuf> {
    let path = start
        .ancestors()
        .map(|dir| dir.join(".env"))
        .find(|candidate| candidate.is_file())?;
    dotenvy::from_path(&path).ok()?;
    Some(path)
}

/// Comma-separated list of the models the front ends offer.
pub fn model_choices() -> String {
    KnownModel::ALL
        .iter()
        .map(KnownModel::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Settings for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// Optional system prompt, sent as a leading system message on every request.
    pub system_prompt: Option<String>,

    /// Sampling temperature; `None` leaves it to the service.
    pub temperature: Option<Temperature>,

    /// API root override.
    pub base_url: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates the settings the advanced front end starts with.
    ///
    /// Defaults:
    /// - Model: gpt-3.5-turbo
    /// - Temperature: 0.7
    /// - System prompt: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::Known(KnownModel::Gpt35Turbo),
            system_prompt: None,
            temperature: Some(Temperature::default()),
            base_url: None,
            use_color: true,
        }
    }

    /// Creates the fixed settings of the simple front end: no temperature, no system prompt.
    pub fn simple() -> Self {
        Self {
            temperature: None,
            ..Self::new()
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<Model>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<Temperature>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = ChatArgsError;

    fn try_from(args: ChatArgs) -> Result<Self, Self::Error> {
        let model = match args.model {
            Some(name) => name
                .parse::<KnownModel>()
                .map(Model::Known)
                .map_err(|_| ChatArgsError::UnknownModel(name))?,
            None => Model::Known(KnownModel::default()),
        };
        let temperature = match args.temperature {
            Some(value) => {
                let parsed = value
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| ChatArgsError::InvalidTemperature(value.clone()))?;
                Temperature::new(parsed).map_err(|_| ChatArgsError::InvalidTemperature(value))?
            }
            None => Temperature::default(),
        };

        Ok(ChatConfig {
            model,
            system_prompt: args.system.filter(|prompt| !prompt.trim().is_empty()),
            temperature: Some(temperature),
            base_url: args.base_url,
            use_color: !args.no_color,
        })
    }
}

impl From<SimpleArgs> for ChatConfig {
    fn from(args: SimpleArgs) -> Self {
        ChatConfig {
            base_url: args.base_url,
            use_color: !args.no_color,
            ..ChatConfig::simple()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, Model::Known(KnownModel::Gpt35Turbo));
        assert_eq!(config.temperature, Some(Temperature::default()));
        assert!(config.system_prompt.is_none());
        assert!(config.base_url.is_none());
        assert!(config.use_color);
    }

    #[test]
    fn simple_config_has_no_settings() {
        let config = ChatConfig::simple();
        assert_eq!(config.model, Model::Known(KnownModel::Gpt35Turbo));
        assert!(config.temperature.is_none());
        assert!(config.system_prompt.is_none());
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::try_from(ChatArgs::default()).unwrap();
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("gpt-4".to_string()),
            system: Some("You are a helpful coding assistant.".to_string()),
            temperature: Some("1.2".to_string()),
            base_url: Some("http://localhost:8080/v1/".to_string()),
            no_color: true,
        };
        let config = ChatConfig::try_from(args).unwrap();
        assert_eq!(config.model, Model::Known(KnownModel::Gpt4));
        assert_eq!(
            config.system_prompt.as_deref(),
            Some("You are a helpful coding assistant.")
        );
        assert_eq!(config.temperature, Some(Temperature::new(1.2).unwrap()));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1/"));
        assert!(!config.use_color);
    }

    #[test]
    fn config_from_args_rejects_bad_values() {
        let args = ChatArgs {
            model: Some("gpt-9".to_string()),
            ..ChatArgs::default()
        };
        assert_eq!(
            ChatConfig::try_from(args),
            Err(ChatArgsError::UnknownModel("gpt-9".to_string()))
        );

        for value in ["2.5", "-1", "warm"] {
            let args = ChatArgs {
                temperature: Some(value.to_string()),
                ..ChatArgs::default()
            };
            assert_eq!(
                ChatConfig::try_from(args),
                Err(ChatArgsError::InvalidTemperature(value.to_string()))
            );
        }
    }

    #[test]
    fn blank_system_prompt_is_dropped() {
        let args = ChatArgs {
            system: Some("   ".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).unwrap().system_prompt.is_none());
    }

    #[test]
    fn simple_args() {
        let config = ChatConfig::from(SimpleArgs {
            base_url: None,
            no_color: true,
        });
        assert!(!config.use_color);
        assert!(config.temperature.is_none());
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_model(KnownModel::Gpt4TurboPreview)
            .with_system_prompt("Test prompt")
            .with_temperature(Some(Temperature::new(0.0).unwrap()))
            .with_base_url("http://127.0.0.1:1/")
            .without_color();

        assert_eq!(config.model, Model::Known(KnownModel::Gpt4TurboPreview));
        assert_eq!(config.system_prompt.as_deref(), Some("Test prompt"));
        assert_eq!(config.temperature, Some(Temperature::new(0.0).unwrap()));
        assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:1/"));
        assert!(!config.use_color);
    }

    #[test]
    fn env_file_is_found_in_a_parent() {
        let root = env::temp_dir().join(format!("colloquy-env-{}", std::process::id()));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(".env"), "COLLOQUY_ENV_FILE_TEST=from-file\n").unwrap();

        assert_eq!(load_env_file_from(&nested), Some(root.join(".env")));
        assert_eq!(env::var("COLLOQUY_ENV_FILE_TEST").as_deref(), Ok("from-file"));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn model_choices_lists_all() {
        assert_eq!(model_choices(), "gpt-3.5-turbo, gpt-4, gpt-4-turbo-preview");
    }
}
