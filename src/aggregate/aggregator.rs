use std::path::Path;

use serde::Serialize;

use crate::source::event_source::EventSource;
use crate::tagging::event_model::{Event, PageEvent, page_label};
use crate::trace::logger::TraceSink;
use crate::trace::trace::{TraceEvent, TraceScope, TraceStage};

// ============================================================================
// Batch input
// ============================================================================

/// One uploaded screenshot: display name plus raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageInput {
    pub fn new(filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.to_string(),
            bytes,
        }
    }

    /// Read an image from disk, named by its file name component.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { filename, bytes })
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Merge per-image event lists into the ordered batch result.
///
/// Images are numbered from 1 in the order given; events keep their
/// discovery order. An empty merge yields exactly one fallback row.
pub fn merge_page_events<I>(per_image: I) -> Vec<PageEvent>
where
    I: IntoIterator<Item = (String, Vec<Event>)>,
{
    let mut merged = Vec::new();

    for (i, (filename, events)) in per_image.into_iter().enumerate() {
        let page = page_label(&filename, i + 1);
        merged.extend(events.into_iter().map(|e| PageEvent::from_event(&page, e)));
    }

    if merged.is_empty() {
        merged.push(PageEvent::fallback());
    }

    merged
}

/// An image whose source failed outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedImage {
    pub page: String,
    pub reason: String,
}

/// Result of tagging one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub events: Vec<PageEvent>,
    pub skipped: Vec<SkippedImage>,
    pub image_count: usize,
}

impl BatchOutcome {
    /// Whether the batch fell back to the placeholder row.
    pub fn used_fallback(&self) -> bool {
        self.events.len() == 1 && self.events[0].is_fallback()
    }
}

/// Tag every image of a batch with one event source.
///
/// Images are processed one at a time in submission order. An image whose
/// source returns an error contributes no events and is listed in
/// `skipped`; the rest of the batch continues.
pub fn tag_batch(images: &[ImageInput], source: &dyn EventSource, sink: &dyn TraceSink) -> BatchOutcome {
    let kind = source.kind().to_string();
    let mut per_image = Vec::with_capacity(images.len());
    let mut skipped = Vec::new();

    for (i, image) in images.iter().enumerate() {
        let step = i as u64 + 1;
        let scope = TraceScope::new(sink, step, &image.filename, &image.bytes, &kind);

        let events = match source.detect(&image.bytes, &scope) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("skipping {}: {}", image.filename, e);
                scope.record(TraceStage::ImageSkipped, Some(0), Some(e.to_string()));
                skipped.push(SkippedImage {
                    page: page_label(&image.filename, i + 1),
                    reason: e.to_string(),
                });
                Vec::new()
            }
        };

        tracing::info!("{} (page {}): {} events", image.filename, step, events.len());
        per_image.push((image.filename.clone(), events));
    }

    let events = merge_page_events(per_image);
    let outcome = BatchOutcome {
        events,
        skipped,
        image_count: images.len(),
    };

    let final_step = images.len() as u64 + 1;
    if outcome.used_fallback() {
        sink.log(
            &TraceEvent::now(final_step, TraceStage::FallbackApplied)
                .with_source(&kind)
                .with_detail("no events detected in batch"),
        );
    }
    sink.log(
        &TraceEvent::now(final_step, TraceStage::BatchCompleted)
            .with_source(&kind)
            .with_count(outcome.events.len()),
    );

    outcome
}
