// Public modules
pub mod aggregator;
pub mod app;
pub mod client;
pub mod client_logger;
pub mod credentials;
pub mod error;
pub mod render;
pub mod session;
pub mod types;

mod observability;
mod sse;

// Re-exports
pub use aggregator::{
    AggregateReport, PLACEHOLDER_CAPTION, SlideAggregator, SlideSink, aggregate, slides,
};
pub use client::{API_KEY_ENV, ChunkStream, Gemini};
pub use client_logger::{ClientLogger, StderrLogger};
pub use credentials::CredentialStore;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer, Slideshow, render_caption, render_slide};
pub use session::{ADDITIONAL_INSTRUCTIONS, ChatBackend, ChatSession};
pub use types::*;
