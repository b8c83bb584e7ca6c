use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("explainer.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("explainer.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("explainer.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("explainer.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("explainer.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("explainer.stream.bytes");

pub(crate) static SLIDES_EMITTED: Counter = Counter::new("explainer.slides.emitted");
pub(crate) static SLIDES_TRAILING: Counter = Counter::new("explainer.slides.trailing");
pub(crate) static IMAGES_REPLACED: Counter = Counter::new("explainer.slides.images_replaced");
pub(crate) static IMAGE_DECODE_ERRORS: Counter =
    Counter::new("explainer.slides.image_decode_errors");
pub(crate) static TEXT_DROPPED: Counter = Counter::new("explainer.slides.text_dropped");

pub(crate) static GENERATIONS: Counter = Counter::new("explainer.ui.generations");
pub(crate) static GENERATIONS_IGNORED: Counter = Counter::new("explainer.ui.generations_ignored");
pub(crate) static GENERATION_FAILURES: Counter = Counter::new("explainer.ui.generation_failures");
pub(crate) static GENERATION_DURATION: Moments =
    Moments::new("explainer.ui.generation_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&SLIDES_EMITTED);
    collector.register_counter(&SLIDES_TRAILING);
    collector.register_counter(&IMAGES_REPLACED);
    collector.register_counter(&IMAGE_DECODE_ERRORS);
    collector.register_counter(&TEXT_DROPPED);

    collector.register_counter(&GENERATIONS);
    collector.register_counter(&GENERATIONS_IGNORED);
    collector.register_counter(&GENERATION_FAILURES);
    collector.register_moments(&GENERATION_DURATION);
}
