//! One owned conversation with a generative model.
//!
//! A [`ChatSession`] is created when a generation starts and dropped when it
//! ends.  It borrows a [`ChatBackend`] for transport, keeps the ordered turn
//! history, and appends the explainer instructions to every user message.

use crate::Result;
use crate::client::ChunkStream;
use crate::types::{Content, GenerateContentRequest, GenerationConfig};

/// Instructions appended to every user message.
///
/// They steer the model toward short points, each with one illustration,
/// which is the shape the slide aggregator pairs up.
pub const ADDITIONAL_INSTRUCTIONS: &str = "
Explain the topic in a series of simple, easy-to-understand points.
Keep sentences short but conversational, casual, and engaging.
For each point, generate a cute, minimal illustration with black ink on a white background that visually represents the concept.
No commentary, just begin your explanation.
Keep going until you're done.";

/// Transport for streamed chat requests.
///
/// [`Gemini`](crate::Gemini) is the production implementation.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the request and return the response chunk stream.
    async fn stream_chat(&self, model: &str, request: GenerateContentRequest)
    -> Result<ChunkStream>;
}

/// A conversation against one model.
pub struct ChatSession<'a> {
    backend: &'a dyn ChatBackend,
    model: String,
    instructions: String,
    generation_config: GenerationConfig,
    history: Vec<Content>,
}

impl<'a> ChatSession<'a> {
    /// Open a session on a configured backend.
    ///
    /// Fails with a not-configured error when there is no backend, before any
    /// request is attempted.
    pub fn open(backend: Option<&'a dyn ChatBackend>, model: impl Into<String>) -> Result<Self> {
        let backend = backend.ok_or_else(|| {
            crate::Error::not_configured("no API key is configured; set one with /key")
        })?;
        Ok(Self::new(backend, model))
    }

    /// Create a session with an empty history, requesting text and images.
    pub fn new(backend: &'a dyn ChatBackend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            instructions: ADDITIONAL_INSTRUCTIONS.to_string(),
            generation_config: GenerationConfig::text_and_image(),
            history: Vec::new(),
        }
    }

    /// Replace the instructions appended to each message.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.generation_config = self.generation_config.with_temperature(temperature);
        self
    }

    /// Seed the session with prior turns.
    pub fn with_history(mut self, history: Vec<Content>) -> Self {
        self.history = history;
        self
    }

    /// The model this session talks to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The turns sent so far, oldest first.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Record the model's reply so a follow-up message carries it.
    pub fn record_model_turn(&mut self, content: Content) {
        self.history.push(content);
    }

    /// Build the request `send` would issue for this message.
    pub fn request_for(&self, user_message: &str) -> GenerateContentRequest {
        let mut contents = self.history.clone();
        contents.push(self.user_turn(user_message));
        GenerateContentRequest::new(contents).with_generation_config(self.generation_config.clone())
    }

    /// Send a user message and return the streamed response.
    ///
    /// The user turn enters the history only when the request is accepted.
    pub async fn send(&mut self, user_message: &str) -> Result<ChunkStream> {
        let request = self.request_for(user_message);
        let stream = self.backend.stream_chat(&self.model, request).await?;
        self.history.push(self.user_turn(user_message));
        Ok(stream)
    }

    fn user_turn(&self, user_message: &str) -> Content {
        Content::user(format!("{user_message}{}", self.instructions))
    }
}
