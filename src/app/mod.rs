//! The interactive explainer application.
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and the YAML config file
//! - [`commands`]: slash command parsing for the REPL
//! - [`controller`]: the Idle/Generating state machine that runs generations

pub mod commands;
pub mod config;
pub mod controller;

pub use commands::{Command, help_text, parse_command};
pub use config::{AppArgs, AppConfig, ConfigFile, DEFAULT_EXAMPLES, DEFAULT_MODEL};
pub use controller::{
    Controller, CredentialStatus, GenerationOutcome, SUBMIT_LABEL_GENERATING, SUBMIT_LABEL_IDLE,
    UiState, ViewState, parse_error_message,
};
