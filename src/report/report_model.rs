use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::aggregator::{BatchOutcome, SkippedImage};
use crate::tagging::event_model::PageEvent;

// ============================================================================
// Tagging report — one batch outcome prepared for export
// ============================================================================

/// Column headers shared by every tabular export.
pub const HEADERS: [&str; 5] = ["Page", "Element", "Event Type", "Trigger", "Description"];

/// Export-ready view of a tagged batch.
///
/// Built from a `BatchOutcome` via `from_outcome()`. Consumed by the
/// console, CSV, HTML and JSON reporters.
#[derive(Debug, Clone, Serialize)]
pub struct TaggingReport {
    /// Name shown in report headers
    pub title: String,

    /// Event source the batch ran through
    pub source: String,

    /// Number of images submitted
    pub image_count: usize,

    /// Rows counted per event type, in name order
    pub counts_by_type: BTreeMap<String, usize>,

    /// Whether the placeholder row stands in for an empty batch
    pub used_fallback: bool,

    /// Total processing duration in milliseconds (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,

    /// Images whose source failed
    pub skipped: Vec<SkippedImage>,

    /// Ordered rows
    pub events: Vec<PageEvent>,
}

impl TaggingReport {
    pub fn from_outcome(title: &str, source: &str, outcome: BatchOutcome) -> Self {
        let used_fallback = outcome.used_fallback();

        let mut counts_by_type = BTreeMap::new();
        if !used_fallback {
            for event in &outcome.events {
                *counts_by_type
                    .entry(event.event_type.to_string())
                    .or_insert(0) += 1;
            }
        }

        Self {
            title: title.to_string(),
            source: source.to_string(),
            image_count: outcome.image_count,
            counts_by_type,
            used_fallback,
            duration_ms: None,
            skipped: outcome.skipped,
            events: outcome.events,
        }
    }

    /// Set the total processing duration.
    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Number of real (non-placeholder) rows.
    pub fn detected_count(&self) -> usize {
        if self.used_fallback {
            0
        } else {
            self.events.len()
        }
    }
}

/// Row cells in `HEADERS` order.
pub fn row_cells(event: &PageEvent) -> [&str; 5] {
    [
        &event.page,
        &event.element,
        event.event_type.as_str(),
        &event.trigger,
        &event.description,
    ]
}
