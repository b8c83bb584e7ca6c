//! Interactive explainer: type a topic, get an illustrated slideshow.
//!
//! Each topic is streamed to the model; slides are printed as soon as a
//! caption and its illustration pair up, and the deck is written to an HTML
//! file when an output path is set.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage; the key comes from the credential store or GEMINI_API_KEY
//! explainer
//!
//! # Write every deck to an HTML file
//! explainer --output slideshow.html
//!
//! # Disable colors (useful for piping output)
//! explainer --no-color
//! ```
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/examples` - List example topics
//! - `/example <n>` - Explain example topic n
//! - `/key <api-key>` - Save an API key
//! - `/clearkey` - Forget the saved key
//! - `/status` - Show key, model, and output settings
//! - `/output <path>` - Write slides to an HTML file
//! - `/model <name>` - Change the model
//! - `/quit` - Exit the application

use std::path::PathBuf;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use explainer::app::{
    AppArgs, AppConfig, Command, Controller, GenerationOutcome, help_text, parse_command,
};
use explainer::{CredentialStore, PlainTextRenderer, Renderer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = AppArgs::from_command_line_relaxed("explainer [OPTIONS]");
    let config = AppConfig::from_args(args)?;
    let use_color = config.use_color;

    let mut controller = Controller::new(config);
    if let Some(store) = CredentialStore::default_location() {
        controller = controller.with_store(store);
    }
    let mut renderer = PlainTextRenderer::with_color(use_color);
    if let Err(err) = controller.connect() {
        renderer.print_error(&format!("Could not load API key: {err}"));
    }
    let mut rl = DefaultEditor::new()?;

    println!("Explainer (model: {})", controller.config().model);
    println!("{}", controller.credential_status());
    println!("Type a topic to explain, /help for commands, /quit to exit\n");

    loop {
        match rl.readline("Topic: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        Command::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        Command::Help => {
                            for line in help_text().lines() {
                                println!("    {line}");
                            }
                        }
                        Command::Examples => {
                            for (index, example) in controller.config().examples.iter().enumerate()
                            {
                                println!("    {}. {example}", index + 1);
                            }
                        }
                        Command::Example(index) => {
                            match controller.example(index, &mut renderer).await {
                                Ok(outcome) => report_outcome(&controller, &outcome, &mut renderer),
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        Command::SetKey(key) => match controller.save_credential(&key) {
                            Ok(()) => renderer.print_info("API key saved."),
                            Err(err) => {
                                renderer.print_error(&format!("Failed to save API key: {err}"))
                            }
                        },
                        Command::ClearKey => match controller.clear_credential() {
                            Ok(()) => renderer.print_info("API key cleared."),
                            Err(err) => {
                                renderer.print_error(&format!("Failed to clear API key: {err}"))
                            }
                        },
                        Command::Status => print_status(&controller),
                        Command::Output(path) => {
                            controller.set_output(Some(PathBuf::from(&path)));
                            renderer.print_info(&format!("Slides will be written to {path}"));
                        }
                        Command::ClearOutput => {
                            controller.set_output(None);
                            renderer.print_info("Slides will no longer be written to disk.");
                        }
                        Command::Model(model) => {
                            controller.set_model(model.clone());
                            renderer.print_info(&format!("Model changed to: {model}"));
                        }
                        Command::Invalid(message) => renderer.print_error(&message),
                    }
                    continue;
                }

                controller.set_input(line);
                let outcome = controller.generate(line, &mut renderer).await;
                report_outcome(&controller, &outcome, &mut renderer);
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
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}

fn report_outcome(
    controller: &Controller,
    outcome: &GenerationOutcome,
    renderer: &mut dyn Renderer,
) {
    if let GenerationOutcome::Completed(report) = outcome {
        if report.skipped_images > 0 {
            renderer.print_info(&format!(
                "{} image(s) could not be decoded and were skipped.",
                report.skipped_images
            ));
        }
        if let Some(path) = &controller.config().output {
            renderer.print_info(&format!("Slideshow written to {}", path.display()));
        }
    }
}

fn print_status(controller: &Controller) {
    let config = controller.config();
    println!("    Status:");
    println!("      Credentials: {}", controller.credential_status());
    match controller.credential_path() {
        Some(path) => println!("      Credential file: {}", path.display()),
        None => println!("      Credential file: (none)"),
    }
    println!("      Model: {}", config.model);
    match &config.output {
        Some(path) => println!("      Output: {}", path.display()),
        None => println!("      Output: (disabled)"),
    }
    println!("      Slides in last deck: {}", controller.slideshow().len());
}
