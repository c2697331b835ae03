use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Tagging output model — events inferred from a single screenshot
// ============================================================================

pub const FALLBACK_PAGE: &str = "N/A";
pub const FALLBACK_ELEMENT: &str = "Unknown";
pub const FALLBACK_TRIGGER: &str = "No element detected by heuristics";
pub const FALLBACK_DESCRIPTION: &str =
    "Please review manually or enable the annotation source for better detection";

/// Kind of user interaction an event describes.
///
/// The rule table only produces `Click` and `View`. Anything else an external
/// annotation returns is kept verbatim in `Other`, including the empty string
/// when the field was missing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Click,
    View,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Click => "Click",
            EventType::View => "View",
            EventType::Other(raw) => raw,
        }
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "click" => EventType::Click,
            "view" => EventType::View,
            _ => EventType::Other(raw),
        }
    }
}

impl From<&str> for EventType {
    fn from(raw: &str) -> Self {
        EventType::from(raw.to_string())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single inferred user interaction on one screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub element: String,
    pub event_type: EventType,
    pub trigger: String,
    pub description: String,
}

impl Event {
    /// Composite key used for per-image deduplication.
    pub fn key(&self) -> (&str, &EventType) {
        (&self.element, &self.event_type)
    }
}

/// An `Event` attributed to the screenshot it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEvent {
    pub page: String,
    pub element: String,
    pub event_type: EventType,
    pub trigger: String,
    pub description: String,
}

impl PageEvent {
    pub fn from_event(page: &str, event: Event) -> Self {
        Self {
            page: page.to_string(),
            element: event.element,
            event_type: event.event_type,
            trigger: event.trigger,
            description: event.description,
        }
    }

    /// Placeholder row emitted when a whole batch produced no events.
    pub fn fallback() -> Self {
        Self {
            page: FALLBACK_PAGE.to_string(),
            element: FALLBACK_ELEMENT.to_string(),
            event_type: EventType::View,
            trigger: FALLBACK_TRIGGER.to_string(),
            description: FALLBACK_DESCRIPTION.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.page == FALLBACK_PAGE && self.element == FALLBACK_ELEMENT
    }
}

/// Page identifier for the `index`-th (1-based) image of a batch.
pub fn page_label(filename: &str, index: usize) -> String {
    format!("{} (page {})", filename, index)
}
