use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::aggregator::ImageInput;
use crate::source::error::SourceError;
use crate::source::ocr::{OcrEngine, TesseractOcr};
use crate::source::vision_model::{
    DEFAULT_VISION_ENDPOINT, DEFAULT_VISION_MODEL, DEFAULT_VISION_TIMEOUT_SECS, MockVision,
    OllamaVision, VisionInference,
};
use crate::tagging::event_model::Event;
use crate::tagging::matcher::match_events;
use crate::tagging::normalize::{content_line_count, normalize_ocr_text};
use crate::trace::logger::TraceSink;
use crate::trace::trace::{TraceScope, TraceStage};

// ============================================================================
// EventSource trait — image bytes to a list of events
// ============================================================================

/// Produces the events visible on one screenshot.
///
/// An `Err` means this image could not be processed at all. The batch driver
/// skips it and keeps going.
pub trait EventSource {
    fn detect(&self, image: &[u8], scope: &TraceScope) -> Result<Vec<Event>, SourceError>;

    fn kind(&self) -> EventSourceKind;
}

/// Which event source a batch runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSourceKind {
    Heuristic,
    Annotation,
}

impl EventSourceKind {
    /// Parse a CLI/config name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "heuristic" | "local" | "ocr" => Some(EventSourceKind::Heuristic),
            "annotation" | "vision" | "llm" => Some(EventSourceKind::Annotation),
            _ => None,
        }
    }
}

impl fmt::Display for EventSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSourceKind::Heuristic => f.write_str("heuristic"),
            EventSourceKind::Annotation => f.write_str("annotation"),
        }
    }
}

// ============================================================================
// HeuristicSource — OCR, normalize, keyword rules
// ============================================================================

pub struct HeuristicSource {
    ocr: Box<dyn OcrEngine>,
}

impl HeuristicSource {
    pub fn new(ocr: Box<dyn OcrEngine>) -> Self {
        Self { ocr }
    }
}

impl EventSource for HeuristicSource {
    fn detect(&self, image: &[u8], scope: &TraceScope) -> Result<Vec<Event>, SourceError> {
        let raw = self.ocr.recognize(image)?;
        scope.record(
            TraceStage::OcrCompleted,
            None,
            Some(format!(
                "{} via {}: {} chars, {} lines",
                scope.image(),
                self.ocr.name(),
                raw.len(),
                content_line_count(&raw)
            )),
        );

        let normalized = normalize_ocr_text(&raw);
        let events = match_events(&normalized);
        tracing::debug!("{}: {} heuristic events", scope.image(), events.len());
        scope.record(TraceStage::EventsMatched, Some(events.len()), None);

        Ok(events)
    }

    fn kind(&self) -> EventSourceKind {
        EventSourceKind::Heuristic
    }
}

// ============================================================================
// AnnotationSource — external vision model returning JSON events
// ============================================================================

pub const ANNOTATION_PROMPT: &str = r#"You are tagging a screenshot of an application's user interface for analytics.

List every user interaction the screen supports or displays. Return ONLY a JSON object with a single "events" array, where each entry has exactly these fields:
{
  "events": [
    {
      "page": "short name of the screen",
      "element": "short display name of the UI element, e.g. Upload Button",
      "event_type": "Click|View",
      "trigger": "what visible evidence on the screen produced this event",
      "description": "what the interaction means for the user"
    }
  ]
}

Use "Click" for controls the user can press or select and "View" for content the user only reads.
Respond with ONLY valid JSON, no explanation."#;

/// One entry of the vision model's answer. Absent fields become `""`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationRecord {
    pub page: String,
    pub element: String,
    pub event_type: String,
    pub trigger: String,
    pub description: String,
}

const RECORD_FIELDS: [&str; 5] = ["page", "element", "event_type", "trigger", "description"];

impl AnnotationRecord {
    /// Read one array entry. Strings are copied verbatim, `null` and missing
    /// fields become `""`, other values keep their JSON text form. Entries
    /// that are not objects, or carry none of the schema fields, are rejected.
    pub fn from_value(item: &Value) -> Option<Self> {
        let map = item.as_object()?;
        if !RECORD_FIELDS.iter().any(|k| map.contains_key(*k)) {
            return None;
        }

        let field = |key: &str| match map.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        Some(Self {
            page: field("page"),
            element: field("element"),
            event_type: field("event_type"),
            trigger: field("trigger"),
            description: field("description"),
        })
    }

    pub fn into_event(self) -> Event {
        Event {
            element: self.element,
            event_type: self.event_type.into(),
            trigger: self.trigger,
            description: self.description,
        }
    }
}

/// Vision-model event source. Every failure is absorbed: a transport error
/// or an unparseable answer yields zero events for that image, no retry.
pub struct AnnotationSource {
    backend: Box<dyn VisionInference>,
    prompt: String,
}

impl AnnotationSource {
    pub fn new(backend: Box<dyn VisionInference>) -> Self {
        Self {
            backend,
            prompt: ANNOTATION_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }

    /// Create an AnnotationSource backed by a canned vision response.
    pub fn with_mock_response(response: &str) -> Self {
        Self::new(Box::new(MockVision::Respond(response.to_string())))
    }

    /// Run every image in order and concatenate the results, no dedup.
    pub fn annotate_all(&self, images: &[ImageInput], sink: &dyn TraceSink) -> Vec<Event> {
        images
            .iter()
            .enumerate()
            .flat_map(|(i, image)| {
                let scope = TraceScope::new(sink, i as u64 + 1, &image.filename, &image.bytes, "annotation");
                self.annotate(&image.bytes, &scope)
            })
            .collect()
    }

    pub fn annotate(&self, image: &[u8], scope: &TraceScope) -> Vec<Event> {
        let response = match self.backend.describe_image(image, &self.prompt) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("annotation failed for {}: {}", scope.image(), e);
                scope.record(TraceStage::AnnotationFailed, Some(0), Some(e.to_string()));
                return vec![];
            }
        };

        match try_parse_annotation_response(&response) {
            Some(records) => {
                let events: Vec<Event> = records.into_iter().map(AnnotationRecord::into_event).collect();
                scope.record(TraceStage::AnnotationReceived, Some(events.len()), None);
                events
            }
            None => {
                tracing::warn!(
                    "annotation for {} is not a JSON event list ({} chars)",
                    scope.image(),
                    response.len()
                );
                scope.record(
                    TraceStage::AnnotationUnparsed,
                    Some(0),
                    Some(truncate(&response, 200)),
                );
                vec![]
            }
        }
    }
}

impl EventSource for AnnotationSource {
    fn detect(&self, image: &[u8], scope: &TraceScope) -> Result<Vec<Event>, SourceError> {
        Ok(self.annotate(image, scope))
    }

    fn kind(&self) -> EventSourceKind {
        EventSourceKind::Annotation
    }
}

// ============================================================================
// Response recovery
// ============================================================================

/// Parse a vision model answer into annotation records.
///
/// Accepts a JSON array, an object holding the array under `"events"` (or
/// under any other single key), or a single event object. Markdown code
/// fences, preamble text before the JSON and trailing commas are tolerated.
/// Entries that are not event objects are skipped.
///
/// Returns `None` when nothing usable is found, including a non-empty answer
/// in which no entry is an event. An empty array is a valid answer.
pub fn try_parse_annotation_response(response: &str) -> Option<Vec<AnnotationRecord>> {
    let value = parse_lenient_json(response)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(items)) => items,
            Some(_) => return None,
            None if map.len() == 1 && map.values().all(Value::is_array) => {
                match map.into_iter().next() {
                    Some((_, Value::Array(items))) => items,
                    _ => return None,
                }
            }
            None => vec![Value::Object(map)],
        },
        _ => return None,
    };

    let records: Vec<AnnotationRecord> =
        items.iter().filter_map(AnnotationRecord::from_value).collect();
    if records.is_empty() && !items.is_empty() {
        return None;
    }
    Some(records)
}

fn parse_lenient_json(response: &str) -> Option<Value> {
    let body = strip_code_fences(response.trim());

    if let Ok(v) = serde_json::from_str::<Value>(body) {
        return Some(v);
    }

    let start = body.find(['[', '{'])?;
    let close = if body[start..].starts_with('[') { ']' } else { '}' };
    let end = body.rfind(close)?;
    if end < start {
        return None;
    }
    let candidate = &body[start..=end];

    serde_json::from_str::<Value>(candidate)
        .ok()
        .or_else(|| serde_json::from_str::<Value>(&remove_trailing_commas(candidate)).ok())
}

fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string ("json") on the opening fence line.
    let rest = rest.find('\n').map(|i| &rest[i + 1..]).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Drop commas directly followed (ignoring whitespace) by `]` or `}`,
/// outside of string literals.
fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some(']') | Some('}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }
}

// ============================================================================
// Construction
// ============================================================================

/// Everything needed to build either event source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub ocr_command: String,
    pub ocr_language: String,
    pub vision_endpoint: String,
    pub vision_model: String,
    pub vision_timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            ocr_command: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            vision_endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            vision_timeout_secs: DEFAULT_VISION_TIMEOUT_SECS,
        }
    }
}

/// Build the event source selected for a batch.
pub fn build_source(kind: EventSourceKind, settings: &SourceSettings) -> Box<dyn EventSource> {
    match kind {
        EventSourceKind::Heuristic => Box::new(HeuristicSource::new(Box::new(TesseractOcr::new(
            &settings.ocr_command,
            &settings.ocr_language,
        )))),
        EventSourceKind::Annotation => Box::new(AnnotationSource::new(Box::new(OllamaVision::new(
            &settings.vision_endpoint,
            &settings.vision_model,
            settings.vision_timeout_secs,
        )))),
    }
}
