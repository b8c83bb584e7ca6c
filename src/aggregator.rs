//! Pairs streamed caption text with streamed images to form slides.
//!
//! The model interleaves text and image parts in no guaranteed order.  The
//! aggregator accumulates text until an image is also pending, then emits a
//! [`Slide`] and starts over.  Pairing is checked after every part, so one
//! chunk can yield several slides.
//!
//! Two behaviors follow from pairing at part granularity:
//!
//! - When two images arrive before any text, the later image replaces the
//!   earlier one.
//! - Text still pending when the stream ends is dropped; an image still pending
//!   becomes one trailing slide with a single-space caption if needed.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};

use crate::client_logger::ClientLogger;
use crate::observability::{
    IMAGE_DECODE_ERRORS, IMAGES_REPLACED, SLIDES_EMITTED, SLIDES_TRAILING, TEXT_DROPPED,
};
use crate::types::{GenerateContentResponse, Part, Slide, SlideImage, UsageMetadata};
use crate::{Error, Result};

/// Caption used for a trailing image that never received text.
pub const PLACEHOLDER_CAPTION: &str = " ";

/// Receives slides as the aggregator emits them.
pub trait SlideSink {
    /// Accept the next slide, in emission order.
    fn accept(&mut self, slide: Slide);
}

impl SlideSink for Vec<Slide> {
    fn accept(&mut self, slide: Slide) {
        self.push(slide);
    }
}

/// Summary of one aggregation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateReport {
    /// Chunks consumed from the stream.
    pub chunks: usize,
    /// Slides emitted, trailing slide included.
    pub slides: usize,
    /// Image parts that failed to decode and were skipped.
    pub skipped_images: usize,
    /// The last usage metadata seen on any chunk.
    pub usage: Option<UsageMetadata>,
}

/// Accumulates parts into slides.
#[derive(Default)]
pub struct SlideAggregator {
    pending_text: String,
    pending_image: Option<SlideImage>,
    logger: Option<Arc<dyn ClientLogger>>,
    report: AggregateReport,
}

impl SlideAggregator {
    /// Create an aggregator with empty accumulators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report chunks and skipped parts to a logger.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Counters for the run so far.
    pub fn report(&self) -> AggregateReport {
        self.report
    }

    /// Process every part of every candidate in a chunk.
    pub fn push_chunk(&mut self, chunk: &GenerateContentResponse) -> Vec<Slide> {
        self.report.chunks += 1;
        if chunk.usage_metadata.is_some() {
            self.report.usage = chunk.usage_metadata;
        }
        if let Some(logger) = &self.logger {
            logger.log_chunk(chunk);
        }

        let mut slides = Vec::new();
        for candidate in chunk.candidates() {
            let Some(content) = &candidate.content else {
                continue;
            };
            for part in content.parts() {
                if let Some(slide) = self.push_part(part) {
                    slides.push(slide);
                }
            }
        }
        slides
    }

    /// Process one part, returning a slide if it completed a pair.
    pub fn push_part(&mut self, part: &Part) -> Option<Slide> {
        if let Some(text) = part.as_text() {
            self.pending_text.push_str(text);
        } else if let Some(inline_data) = &part.inline_data {
            match SlideImage::from_inline_data(inline_data) {
                Ok(image) => {
                    if self.pending_image.replace(image).is_some() {
                        IMAGES_REPLACED.click();
                    }
                }
                Err(err) => {
                    self.skip_image(err);
                }
            }
        }

        if !self.pending_text.is_empty() && self.pending_image.is_some() {
            let caption = std::mem::take(&mut self.pending_text);
            let image = self.pending_image.take()?;
            SLIDES_EMITTED.click();
            self.report.slides += 1;
            return Some(Slide::new(caption, image));
        }
        None
    }

    /// Flush at end of stream.
    ///
    /// Emits a trailing slide when an image is pending.  Pending text without
    /// an image is discarded.
    pub fn finish(&mut self) -> Option<Slide> {
        let text = std::mem::take(&mut self.pending_text);
        let Some(image) = self.pending_image.take() else {
            if !text.is_empty() {
                TEXT_DROPPED.click();
            }
            return None;
        };
        let caption = if text.is_empty() {
            PLACEHOLDER_CAPTION.to_string()
        } else {
            text
        };
        SLIDES_EMITTED.click();
        SLIDES_TRAILING.click();
        self.report.slides += 1;
        Some(Slide::new(caption, image))
    }

    fn skip_image(&mut self, err: Error) {
        IMAGE_DECODE_ERRORS.click();
        self.report.skipped_images += 1;
        self.pending_image = None;
        if let Some(logger) = &self.logger {
            logger.log_part_error(&err);
        }
    }
}

/// Adapt a chunk stream into a slide stream.
///
/// A transport error from the chunk stream is yielded once and ends the slide
/// stream; no trailing slide is flushed after it.
pub fn slides<S>(chunks: S, aggregator: SlideAggregator) -> impl Stream<Item = Result<Slide>>
where
    S: Stream<Item = Result<GenerateContentResponse>> + Unpin,
{
    stream::unfold(
        Some((chunks, aggregator, VecDeque::new())),
        |state| async move {
            let Some((mut chunks, mut aggregator, mut ready)) = state else {
                return None;
            };
            loop {
                if let Some(slide) = ready.pop_front() {
                    return Some((Ok(slide), Some((chunks, aggregator, ready))));
                }
                match chunks.next().await {
                    Some(Ok(chunk)) => ready.extend(aggregator.push_chunk(&chunk)),
                    Some(Err(err)) => return Some((Err(err), None)),
                    None => return aggregator.finish().map(|slide| (Ok(slide), None)),
                }
            }
        },
    )
}

/// Drive a chunk stream to completion, handing each slide to `sink`.
///
/// Slides delivered before a transport error stay delivered; the error is
/// returned and no trailing slide is flushed.
pub async fn aggregate<S>(
    mut chunks: S,
    mut aggregator: SlideAggregator,
    sink: &mut dyn SlideSink,
) -> Result<AggregateReport>
where
    S: Stream<Item = Result<GenerateContentResponse>> + Unpin,
{
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        for slide in aggregator.push_chunk(&chunk) {
            sink.accept(slide);
        }
    }
    if let Some(slide) = aggregator.finish() {
        sink.accept(slide);
    }
    Ok(aggregator.report())
}
