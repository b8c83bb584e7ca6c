//! The explainer's interaction state machine.
//!
//! A [`Controller`] owns the slideshow, the optional backend, and the view
//! state a front end draws from.  Each call to [`Controller::generate`] runs
//! one full generation: it clears the previous deck, streams a new one, and
//! always settles back to [`UiState::Idle`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::aggregator::{AggregateReport, SlideAggregator, SlideSink, aggregate};
use crate::app::config::AppConfig;
use crate::client::Gemini;
use crate::client_logger::{ClientLogger, StderrLogger};
use crate::credentials::CredentialStore;
use crate::observability::{
    GENERATION_DURATION, GENERATION_FAILURES, GENERATIONS, GENERATIONS_IGNORED,
};
use crate::render::{Renderer, Slideshow};
use crate::session::{ChatBackend, ChatSession};
use crate::types::Slide;
use crate::{Error, Result};

/// Label on the submit control while idle.
pub const SUBMIT_LABEL_IDLE: &str = "Explain";

/// Label on the submit control while a generation runs.
pub const SUBMIT_LABEL_GENERATING: &str = "Generating...";

/// Whether a generation is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    /// Waiting for a topic.
    Idle,
    /// Streaming slides for a topic.
    Generating,
}

/// What a front end should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Current contents of the topic input.
    pub input: String,
    /// Whether the topic input accepts edits.
    pub input_enabled: bool,
    /// Whether a topic can be submitted.
    pub submit_enabled: bool,
    /// Text on the submit control.
    pub submit_label: &'static str,
    /// The error banner; `None` when hidden.
    pub error: Option<String>,
}

impl ViewState {
    fn idle() -> Self {
        Self {
            input: String::new(),
            input_enabled: true,
            submit_enabled: true,
            submit_label: SUBMIT_LABEL_IDLE,
            error: None,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::idle()
    }
}

/// How a call to [`Controller::generate`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The topic was blank; nothing happened.
    Ignored,
    /// The stream ran to the end.
    Completed(AggregateReport),
    /// The generation failed; the message is also in the error banner.
    Failed { message: String },
}

/// Whether an API key is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Configured,
    Missing,
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialStatus::Configured => write!(f, "API key configured"),
            CredentialStatus::Missing => write!(f, "no API key (set one with /key)"),
        }
    }
}

/// Drives generations and owns everything they touch.
pub struct Controller {
    config: AppConfig,
    store: Option<CredentialStore>,
    backend: Option<Box<dyn ChatBackend>>,
    logger: Arc<dyn ClientLogger>,
    slideshow: Slideshow,
    state: UiState,
    view: ViewState,
}

impl Controller {
    /// A controller with no backend and no credential store.
    pub fn new(config: AppConfig) -> Self {
        let logger: Arc<dyn ClientLogger> = if config.verbose {
            Arc::new(StderrLogger::verbose())
        } else {
            Arc::new(StderrLogger::new())
        };
        Self {
            config,
            store: None,
            backend: None,
            logger,
            slideshow: Slideshow::new(),
            state: UiState::Idle,
            view: ViewState::idle(),
        }
    }

    /// Persist keys saved through this controller in `store`.
    pub fn with_store(mut self, store: CredentialStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `backend` for generations.
    pub fn with_backend(mut self, backend: Box<dyn ChatBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Report requests, chunks, and skipped images to `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn slideshow(&self) -> &Slideshow {
        &self.slideshow
    }

    /// Replace the topic input.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.view.input = input.into();
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.model = model.into();
    }

    pub fn set_output(&mut self, output: Option<PathBuf>) {
        self.config.output = output;
    }

    /// Install a backend, replacing any existing one.
    pub fn install_backend(&mut self, backend: Box<dyn ChatBackend>) {
        self.backend = Some(backend);
    }

    /// Find a key and build a client from it.
    ///
    /// The credential store is consulted first, then `GEMINI_API_KEY`.
    /// Returns whether a backend is installed afterwards.  A missing key is
    /// not an error.
    pub fn connect(&mut self) -> Result<bool> {
        if self.backend.is_some() {
            return Ok(true);
        }
        let stored = match &self.store {
            Some(store) => store.load()?,
            None => None,
        };
        match self.build_client(stored) {
            Ok(client) => {
                self.backend = Some(Box::new(client));
                Ok(true)
            }
            Err(err) if err.is_not_configured() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Validate, persist, and install an API key.
    ///
    /// The client is built before anything is stored, so a key the client
    /// rejects is never saved.
    pub fn save_credential(&mut self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::validation(
                "API key must not be empty",
                Some("key".to_string()),
            ));
        }
        let client = self.build_client(Some(key.to_string()))?;
        if let Some(store) = &self.store {
            store.save(key)?;
        }
        self.backend = Some(Box::new(client));
        Ok(())
    }

    /// Forget the stored key and drop the backend.
    pub fn clear_credential(&mut self) -> Result<()> {
        if let Some(store) = &self.store {
            store.clear()?;
        }
        self.backend = None;
        Ok(())
    }

    pub fn credential_status(&self) -> CredentialStatus {
        if self.backend.is_some() {
            CredentialStatus::Configured
        } else {
            CredentialStatus::Missing
        }
    }

    /// Where keys are persisted, if anywhere.
    pub fn credential_path(&self) -> Option<&Path> {
        self.store.as_ref().map(CredentialStore::path)
    }

    /// Explain the example prompt at a 1-based index.
    pub async fn example(
        &mut self,
        index: usize,
        renderer: &mut dyn Renderer,
    ) -> Result<GenerationOutcome> {
        let prompt = index
            .checked_sub(1)
            .and_then(|i| self.config.examples.get(i))
            .cloned()
            .ok_or_else(|| {
                Error::validation(
                    format!(
                        "no example {index}; choose 1 to {}",
                        self.config.examples.len()
                    ),
                    Some("index".to_string()),
                )
            })?;
        self.view.input = prompt.clone();
        Ok(self.generate(&prompt, renderer).await)
    }

    /// Run one generation for `message`.
    ///
    /// A blank message is ignored without touching any state.  Otherwise the
    /// previous deck and error are cleared, slides stream into the deck and
    /// `renderer` as they pair up, and the controller returns to idle whether
    /// the stream succeeds or fails.
    pub async fn generate(
        &mut self,
        message: &str,
        renderer: &mut dyn Renderer,
    ) -> GenerationOutcome {
        if message.trim().is_empty() {
            GENERATIONS_IGNORED.click();
            return GenerationOutcome::Ignored;
        }
        GENERATIONS.click();
        let start = Instant::now();

        self.begin_generation();
        renderer.start_generation(message.trim());
        let result = self.run_generation(message, renderer).await;
        GENERATION_DURATION.add(start.elapsed().as_secs_f64());

        let outcome = match result {
            Ok(report) => GenerationOutcome::Completed(report),
            Err(err) => {
                GENERATION_FAILURES.click();
                let message = parse_error_message(&err.to_string());
                let banner = format!("Something went wrong: {message}");
                renderer.print_error(&banner);
                self.view.error = Some(banner);
                GenerationOutcome::Failed { message }
            }
        };
        self.settle();
        renderer.finish_generation(self.slideshow.len());
        outcome
    }

    fn begin_generation(&mut self) {
        self.state = UiState::Generating;
        self.view.input_enabled = false;
        self.view.submit_enabled = false;
        self.view.submit_label = SUBMIT_LABEL_GENERATING;
        self.view.error = None;
        self.slideshow.clear();
    }

    fn settle(&mut self) {
        self.state = UiState::Idle;
        self.view.input_enabled = true;
        self.view.submit_enabled = true;
        self.view.submit_label = SUBMIT_LABEL_IDLE;
    }

    async fn run_generation(
        &mut self,
        message: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<AggregateReport> {
        let mut session = ChatSession::open(self.backend.as_deref(), self.config.model.clone())?
            .with_instructions(self.config.instructions.clone())
            .with_temperature(self.config.temperature);
        let stream = session.send(message).await?;
        self.view.input.clear();

        let aggregator = SlideAggregator::new().with_logger(Arc::clone(&self.logger));
        let mut sink = DeckSink {
            slideshow: &mut self.slideshow,
            renderer,
        };
        let report = aggregate(stream, aggregator, &mut sink).await?;

        if let Some(path) = &self.config.output {
            self.slideshow.write_to(path, message.trim())?;
        }
        Ok(report)
    }

    fn build_client(&self, api_key: Option<String>) -> Result<Gemini> {
        let client = Gemini::with_options(
            api_key,
            self.config.base_url.clone(),
            Some(self.config.timeout),
        )?;
        Ok(client.with_logger(Arc::clone(&self.logger)))
    }
}

/// Appends each slide to the deck and shows it in the terminal.
struct DeckSink<'a> {
    slideshow: &'a mut Slideshow,
    renderer: &'a mut dyn Renderer,
}

impl SlideSink for DeckSink<'_> {
    fn accept(&mut self, slide: Slide) {
        self.slideshow.append(&slide);
        self.renderer.print_slide(self.slideshow.len(), &slide);
    }
}

/// Pull a readable message out of an error string.
///
/// Anything before the first `{` is dropped and the rest is parsed as JSON;
/// `error.message` is returned when present.  Otherwise the input comes back
/// unchanged.
pub fn parse_error_message(error: &str) -> String {
    let message = error.find('{').and_then(|start| {
        let value: serde_json::Value = serde_json::from_str(&error[start..]).ok()?;
        value
            .get("error")?
            .get("message")?
            .as_str()
            .map(str::to_string)
    });
    message.unwrap_or_else(|| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChunkStream;
    use crate::types::{Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedBackend {
        chunks: Vec<Vec<Part>>,
        fail_with: Option<String>,
        calls: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<GenerateContentRequest>>>,
    }

    #[async_trait::async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn stream_chat(
            &self,
            _model: &str,
            request: GenerateContentRequest,
        ) -> Result<ChunkStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            if let Some(message) = &self.fail_with {
                return Err(Error::bad_request(message.clone()));
            }
            let chunks: Vec<Result<GenerateContentResponse>> = self
                .chunks
                .iter()
                .map(|parts| {
                    Ok(GenerateContentResponse::from_content(Content::model(
                        parts.clone(),
                    )))
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        slides: Vec<(usize, String)>,
        errors: Vec<String>,
        finished: Vec<usize>,
    }

    impl Renderer for RecordingRenderer {
        fn print_slide(&mut self, index: usize, slide: &Slide) {
            self.slides.push((index, slide.caption.clone()));
        }

        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }

        fn print_info(&mut self, _: &str) {}

        fn finish_generation(&mut self, slides: usize) {
            self.finished.push(slides);
        }
    }

    fn image(bytes: &[u8]) -> Part {
        Part::inline_data(InlineData::from_bytes(bytes, "image/png"))
    }

    fn controller(backend: ScriptedBackend) -> Controller {
        Controller::new(AppConfig::new()).with_backend(Box::new(backend))
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = ScriptedBackend {
            calls: Arc::clone(&calls),
            ..Default::default()
        };
        let mut controller = controller(backend);
        controller.view.error = Some("earlier".to_string());
        let mut renderer = RecordingRenderer::default();

        let outcome = controller.generate("   \n\t", &mut renderer).await;
        assert_eq!(outcome, GenerationOutcome::Ignored);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.state(), UiState::Idle);
        assert_eq!(controller.view().error.as_deref(), Some("earlier"));
        assert!(renderer.finished.is_empty());
    }

    #[test]
    fn begin_generation_disables_input() {
        let mut controller = Controller::new(AppConfig::new());
        controller.slideshow.append(&Slide::new(
            "old",
            crate::types::SlideImage::new("image/png", vec![1]),
        ));
        controller.view.error = Some("old".to_string());

        controller.begin_generation();
        assert_eq!(controller.state(), UiState::Generating);
        assert!(!controller.view().input_enabled);
        assert!(!controller.view().submit_enabled);
        assert_eq!(controller.view().submit_label, SUBMIT_LABEL_GENERATING);
        assert!(controller.view().error.is_none());
        assert!(controller.slideshow().is_empty());
        assert!(controller.slideshow().is_hidden());

        controller.settle();
        assert_eq!(controller.state(), UiState::Idle);
        assert_eq!(controller.view().submit_label, SUBMIT_LABEL_IDLE);
    }

    #[tokio::test]
    async fn successful_generation_fills_the_deck() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let backend = ScriptedBackend {
            chunks: vec![
                vec![Part::text("Cats nap.")],
                vec![image(b"one"), Part::text("Cats purr.")],
                vec![image(b"two")],
            ],
            requests: Arc::clone(&requests),
            ..Default::default()
        };
        let mut controller = controller(backend);
        controller.set_input("Explain cats.");
        let mut renderer = RecordingRenderer::default();

        let outcome = controller.generate("Explain cats.", &mut renderer).await;
        let GenerationOutcome::Completed(report) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(report.slides, 2);
        assert_eq!(report.chunks, 3);
        assert_eq!(controller.state(), UiState::Idle);
        assert!(controller.view().input_enabled);
        assert!(controller.view().input.is_empty());
        assert!(controller.view().error.is_none());
        assert_eq!(controller.slideshow().len(), 2);
        assert!(!controller.slideshow().is_hidden());
        assert_eq!(
            renderer.slides,
            vec![(1, "Cats nap.".to_string()), (2, "Cats purr.".to_string())]
        );
        assert_eq!(renderer.finished, vec![2]);

        let requests = requests.lock().unwrap();
        let text = requests[0].contents[0].parts()[0].as_text().unwrap();
        assert!(text.starts_with("Explain cats.\nExplain the topic"));
    }

    #[tokio::test]
    async fn failed_generation_sets_error_and_returns_to_idle() {
        let backend = ScriptedBackend {
            fail_with: Some("quota exhausted".to_string()),
            ..Default::default()
        };
        let mut controller = controller(backend);
        controller.set_input("Explain tides.");
        let mut renderer = RecordingRenderer::default();

        let outcome = controller.generate("Explain tides.", &mut renderer).await;
        assert!(matches!(outcome, GenerationOutcome::Failed { .. }));
        assert_eq!(controller.state(), UiState::Idle);
        assert!(controller.view().submit_enabled);
        assert_eq!(controller.view().submit_label, SUBMIT_LABEL_IDLE);
        let banner = controller.view().error.clone().unwrap();
        assert!(banner.starts_with("Something went wrong: "));
        assert!(banner.contains("quota exhausted"));
        assert_eq!(renderer.errors, vec![banner]);
        assert_eq!(controller.view().input, "Explain tides.");
        assert!(controller.slideshow().is_hidden());
    }

    #[tokio::test]
    async fn missing_backend_fails_fast() {
        let mut controller = Controller::new(AppConfig::new());
        assert_eq!(controller.credential_status(), CredentialStatus::Missing);
        let mut renderer = RecordingRenderer::default();

        let outcome = controller.generate("Explain tides.", &mut renderer).await;
        let GenerationOutcome::Failed { message } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(message.contains("Not configured"));
        assert_eq!(controller.state(), UiState::Idle);
    }

    #[tokio::test]
    async fn example_uses_configured_prompt() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let backend = ScriptedBackend {
            requests: Arc::clone(&requests),
            ..Default::default()
        };
        let mut controller = controller(backend);
        let mut renderer = RecordingRenderer::default();

        let outcome = controller.example(2, &mut renderer).await.unwrap();
        assert!(matches!(outcome, GenerationOutcome::Completed(_)));
        let requests = requests.lock().unwrap();
        let text = requests[0].contents[0].parts()[0].as_text().unwrap();
        assert!(text.starts_with("Explain how the tides work."));
        drop(requests);

        assert!(controller.example(0, &mut renderer).await.is_err());
        assert!(controller.example(99, &mut renderer).await.is_err());
    }

    #[tokio::test]
    async fn output_is_written_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.html");
        let backend = ScriptedBackend {
            chunks: vec![vec![Part::text("Hi"), image(b"png")]],
            ..Default::default()
        };
        let mut controller = controller(backend);
        controller.set_output(Some(path.clone()));
        let mut renderer = RecordingRenderer::default();

        controller.generate("Explain hi.", &mut renderer).await;
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<title>Explain hi.</title>"));
        assert!(html.contains("data:image/png;base64,"));
    }

    #[test]
    fn save_and_clear_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.yaml"));
        let mut controller = Controller::new(AppConfig::new()).with_store(store.clone());

        assert!(controller.save_credential("  ").unwrap_err().is_validation());
        assert_eq!(store.load().unwrap(), None);

        controller.save_credential("test-key").unwrap();
        assert_eq!(controller.credential_status(), CredentialStatus::Configured);
        assert_eq!(store.load().unwrap(), Some("test-key".to_string()));

        controller.clear_credential().unwrap();
        assert_eq!(controller.credential_status(), CredentialStatus::Missing);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn connect_prefers_stored_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.yaml"));
        store.save("stored-key").unwrap();
        let mut controller = Controller::new(AppConfig::new()).with_store(store);
        assert!(controller.connect().unwrap());
        assert_eq!(controller.credential_status(), CredentialStatus::Configured);
    }

    #[test]
    fn parse_error_message_extracts_json() {
        let raw = r#"got status 400: {"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(parse_error_message(raw), "API key not valid");
        assert_eq!(parse_error_message("connection reset"), "connection reset");
        assert_eq!(parse_error_message("odd { not json"), "odd { not json");
        assert_eq!(parse_error_message(r#"{"other": 1}"#), r#"{"other": 1}"#);
    }
}
