//! Slash command parsing for the explainer REPL.
//!
//! Lines starting with `/` control the application; every other line is a
//! topic to explain.

/// A parsed REPL command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Display help information.
    Help,

    /// List the example prompts.
    Examples,

    /// Explain the example at this 1-based index.
    Example(usize),

    /// Save an API key.
    SetKey(String),

    /// Forget the saved API key.
    ClearKey,

    /// Show whether a key is configured and where slides go.
    Status,

    /// Set the slideshow output path.
    Output(String),

    /// Stop writing the slideshow to disk.
    ClearOutput,

    /// Change the model.
    Model(String),

    /// Exit the application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(Command)` if the input is a command, or `None` if it should
/// be treated as a topic.
///
/// # Examples
///
/// ```
/// # use explainer::app::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/example 2").is_some());
/// assert!(parse_command("Explain how tides work.").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<Command> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => Command::Help,
        "examples" => Command::Examples,
        "example" => match argument.map(str::parse::<usize>) {
            Some(Ok(index)) if index > 0 => Command::Example(index),
            Some(_) => Command::Invalid("/example expects a positive number".to_string()),
            None => Command::Invalid("/example requires a number (see /examples)".to_string()),
        },
        "key" => match argument {
            Some(key) => Command::SetKey(key.to_string()),
            None => Command::Invalid("/key requires an API key".to_string()),
        },
        "clearkey" => Command::ClearKey,
        "status" => Command::Status,
        "output" => match argument {
            Some(arg) if arg.eq_ignore_ascii_case("clear") => Command::ClearOutput,
            Some(arg) => Command::Output(arg.to_string()),
            None => Command::Invalid("/output requires a file path".to_string()),
        },
        "model" => match argument {
            Some(model) => Command::Model(model.to_string()),
            None => Command::Invalid("/model requires a model name".to_string()),
        },
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /examples              List example topics
  /example <n>           Explain example topic number n
  /key <api-key>         Save an API key
  /clearkey              Forget the saved API key
  /status                Show key, model, and output settings
  /output <path>         Write slides to an HTML file ('clear' to stop)
  /model <name>          Change the model
  /help                  Show this help
  /quit                  Exit

Anything else is a topic to explain."#
}
