//! One-shot explainer: explain the topic given on the command line and write
//! the slideshow to an HTML file.
//!
//! # Usage
//!
//! ```bash
//! explain-topic How do tides work?
//! explain-topic --output tides.html --model gemini-2.0-flash-exp How do tides work?
//! ```
//!
//! Exits with status 1 when the generation fails or produces no slides.

use std::path::PathBuf;

use arrrg::CommandLine;

use explainer::app::{AppArgs, AppConfig, Controller, GenerationOutcome};
use explainer::{CredentialStore, PlainTextRenderer, Renderer};

/// Output file used when none is configured.
const DEFAULT_OUTPUT: &str = "slideshow.html";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = AppArgs::from_command_line_relaxed("explain-topic [OPTIONS] <TOPIC>...");
    let topic = free.join(" ");
    if topic.trim().is_empty() {
        eprintln!("explain-topic: a topic is required");
        std::process::exit(1);
    }

    let mut config = AppConfig::from_args(args)?;
    if config.output.is_none() {
        config.output = Some(PathBuf::from(DEFAULT_OUTPUT));
    }
    let use_color = config.use_color;

    let mut controller = Controller::new(config);
    if let Some(store) = CredentialStore::default_location() {
        controller = controller.with_store(store);
    }
    let mut renderer = PlainTextRenderer::with_color(use_color);
    if !controller.connect()? {
        renderer.print_error(
            "no API key configured; set GEMINI_API_KEY or run `explainer` and use /key",
        );
        std::process::exit(1);
    }

    match controller.generate(&topic, &mut renderer).await {
        GenerationOutcome::Completed(report) if report.slides > 0 => {
            if let Some(path) = &controller.config().output {
                renderer.print_info(&format!("Slideshow written to {}", path.display()));
            }
            Ok(())
        }
        GenerationOutcome::Completed(_) => {
            renderer.print_error("the model returned no illustrated slides");
            std::process::exit(1);
        }
        GenerationOutcome::Failed { .. } | GenerationOutcome::Ignored => std::process::exit(1),
    }
}
