//! Logging trait for Gemini client and slide aggregation events.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! requests sent by the [`Gemini`](crate::Gemini) client, every streamed chunk,
//! and the response parts the slide aggregator had to skip.

use std::io::{self, Write};

use crate::{Error, GenerateContentRequest, GenerateContentResponse};

/// A trait for logging client and aggregation events.
///
/// All methods default to doing nothing so implementors can pick the events
/// they care about.
///
/// # Example
///
/// ```rust,ignore
/// use explainer::{ClientLogger, GenerateContentResponse};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_chunk(&self, chunk: &GenerateContentResponse) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "chunk: {}", serde_json::to_string(chunk).unwrap()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, model: &str, request: &GenerateContentRequest) {
        _ = (model, request);
    }

    /// Log an individual streamed chunk as the aggregator receives it.
    fn log_chunk(&self, chunk: &GenerateContentResponse) {
        _ = chunk;
    }

    /// Log a response part that could not be used.
    ///
    /// Called when an inline image fails to decode.  Aggregation continues
    /// after this call.
    fn log_part_error(&self, error: &Error) {
        _ = error;
    }
}

/// A [`ClientLogger`] that writes one line per event to stderr.
///
/// Chunks are summarized rather than dumped, because image payloads run to
/// hundreds of kilobytes of base64.
#[derive(Debug, Clone, Default)]
pub struct StderrLogger {
    verbose: bool,
}

impl StderrLogger {
    /// Logs part errors only.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Logs requests and chunk summaries as well as part errors.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl ClientLogger for StderrLogger {
    fn log_request(&self, model: &str, request: &GenerateContentRequest) {
        if self.verbose {
            let _ = writeln!(
                io::stderr(),
                "[explainer] request model={model} turns={}",
                request.contents.len()
            );
        }
    }

    fn log_chunk(&self, chunk: &GenerateContentResponse) {
        if self.verbose {
            let (mut texts, mut images) = (0usize, 0usize);
            for candidate in chunk.candidates() {
                if let Some(content) = &candidate.content {
                    for part in content.parts() {
                        if part.as_text().is_some() {
                            texts += 1;
                        } else if part.inline_data.is_some() {
                            images += 1;
                        }
                    }
                }
            }
            let _ = writeln!(
                io::stderr(),
                "[explainer] chunk text_parts={texts} image_parts={images}"
            );
        }
    }

    fn log_part_error(&self, error: &Error) {
        let _ = writeln!(io::stderr(), "[explainer] error processing image data: {error}");
    }
}
