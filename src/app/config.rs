//! Configuration types for the explainer application.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML
//! config file, and the resolved [`AppConfig`] the controller runs with.

use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::Result;
use crate::session::ADDITIONAL_INSTRUCTIONS;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Prompts offered by `/examples`.
pub const DEFAULT_EXAMPLES: &[&str] = &[
    "Explain how neural networks work.",
    "Explain how the tides work.",
    "Explain why the sky is blue.",
    "Explain how a bill becomes a law.",
    "Explain how vaccines train the immune system.",
];

/// Command-line arguments for the explainer tools.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct AppArgs {
    /// Model to use for generation.
    #[arrrg(optional, "Model to use (default: gemini-2.0-flash-exp)", "MODEL")]
    pub model: Option<String>,

    /// YAML config file to load before applying other flags.
    #[arrrg(optional, "Path to a YAML config file", "PATH")]
    pub config: Option<String>,

    /// Where to write the slideshow after each generation.
    #[arrrg(optional, "Write the slideshow HTML to this path", "PATH")]
    pub output: Option<String>,

    /// Override the API base URL.
    #[arrrg(optional, "API base URL", "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 300)", "SECONDS")]
    pub timeout: Option<u32>,

    /// Replace the instructions appended to each topic.
    #[arrrg(optional, "Instructions appended to each topic", "TEXT")]
    pub instructions: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log requests and chunks to stderr.
    #[arrrg(flag, "Log requests and response chunks to stderr")]
    pub verbose: bool,
}

/// The on-disk config file.  Every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub output: Option<PathBuf>,
    pub color: Option<bool>,
    pub instructions: Option<String>,
    pub temperature: Option<f32>,
    pub examples: Option<Vec<String>>,
}

impl ConfigFile {
    /// Load a config file from YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            crate::Error::io(format!("failed to read config {}", path.display()), err)
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Resolved configuration for the explainer.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// The model to request slides from.
    pub model: String,

    /// API base URL; `None` uses the public endpoint.
    pub base_url: Option<String>,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Slideshow output file; `None` keeps the deck in memory only.
    pub output: Option<PathBuf>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to log requests and chunks.
    pub verbose: bool,

    /// Text appended to every topic.
    pub instructions: String,

    /// Optional sampling temperature.
    pub temperature: Option<f32>,

    /// Prompts offered as examples.
    pub examples: Vec<String>,
}

impl AppConfig {
    /// Creates a new AppConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-2.0-flash-exp
    /// - Timeout: 300 seconds
    /// - Output: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output: None,
            use_color: true,
            verbose: false,
            instructions: ADDITIONAL_INSTRUCTIONS.to_string(),
            temperature: None,
            examples: DEFAULT_EXAMPLES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Resolve the config from command-line arguments.
    ///
    /// The config file named by `--config` is applied first; flags win.
    pub fn from_args(args: AppArgs) -> Result<Self> {
        let mut config = Self::new();
        if let Some(path) = &args.config {
            config = config.merge_file(ConfigFile::from_file(path)?);
        }
        if let Some(model) = args.model {
            config.model = model;
        }
        if let Some(base_url) = args.base_url {
            config.base_url = Some(base_url);
        }
        if let Some(timeout) = args.timeout {
            config.timeout = Duration::from_secs(timeout as u64);
        }
        if let Some(output) = args.output {
            config.output = Some(PathBuf::from(output));
        }
        if let Some(instructions) = args.instructions {
            config.instructions = instructions;
        }
        if args.no_color {
            config.use_color = false;
        }
        if args.verbose {
            config.verbose = true;
        }
        Ok(config)
    }

    /// Apply the values present in a config file.
    pub fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(model) = file.model {
            self.model = model;
        }
        if file.base_url.is_some() {
            self.base_url = file.base_url;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if file.output.is_some() {
            self.output = file.output;
        }
        if let Some(color) = file.color {
            self.use_color = color;
        }
        if let Some(instructions) = file.instructions {
            self.instructions = instructions;
        }
        if file.temperature.is_some() {
            self.temperature = file.temperature;
        }
        if let Some(examples) = file.examples {
            self.examples = examples;
        }
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the slideshow output path.
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
