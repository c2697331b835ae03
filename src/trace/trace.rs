use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::trace::logger::TraceSink;

/// What happened to an image (or the batch) when the record was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TraceStage {
    OcrCompleted,
    EventsMatched,
    AnnotationReceived,
    AnnotationFailed,
    AnnotationUnparsed,
    ImageSkipped,
    FallbackApplied,
    BatchCompleted,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u64,

    pub stage: TraceStage,

    pub image: Option<String>,
    pub image_sha1: Option<String>,
    pub source: Option<String>,

    pub event_count: Option<usize>,
    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(step: u64, stage: TraceStage) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            step,
            stage,
            image: None,
            image_sha1: None,
            source: None,
            event_count: None,
            detail: None,
        }
    }

    pub fn with_image(mut self, name: &str, fingerprint: &str) -> Self {
        self.image = Some(name.to_string());
        self.image_sha1 = Some(fingerprint.to_string());
        self
    }

    pub fn with_source(mut self, source: impl ToString) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.event_count = Some(count);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

/// Hex SHA-1 of the image bytes, so trace lines can be matched to files.
pub fn image_fingerprint(bytes: &[u8]) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Trace context for one image of a batch.
pub struct TraceScope<'a> {
    sink: &'a dyn TraceSink,
    step: u64,
    image: &'a str,
    fingerprint: String,
    source: &'a str,
}

impl<'a> TraceScope<'a> {
    pub fn new(sink: &'a dyn TraceSink, step: u64, image: &'a str, bytes: &[u8], source: &'a str) -> Self {
        Self {
            sink,
            step,
            image,
            fingerprint: image_fingerprint(bytes),
            source,
        }
    }

    pub fn image(&self) -> &str {
        self.image
    }

    pub fn record(&self, stage: TraceStage, count: Option<usize>, detail: Option<String>) {
        let mut event = TraceEvent::now(self.step, stage)
            .with_image(self.image, &self.fingerprint)
            .with_source(self.source);
        event.event_count = count;
        event.detail = detail;
        self.sink.log(&event);
    }
}
