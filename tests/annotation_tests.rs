use screen_tagging::{
    aggregate::aggregator::{ImageInput, tag_batch},
    source::{
        error::SourceError,
        event_source::{
            ANNOTATION_PROMPT, AnnotationRecord, AnnotationSource, EventSource, EventSourceKind,
            try_parse_annotation_response,
        },
        vision_model::{MockVision, VisionInference},
    },
    tagging::event_model::{Event, EventType},
    trace::{
        logger::{MemorySink, NullSink},
        trace::{TraceScope, TraceStage},
    },
};

use crate::common::fixtures::text_image;

mod common;

const TWO_EVENTS: &str = r#"[
  {"page": "Deposit", "element": "Upload Front", "event_type": "Click", "trigger": "Upload front label", "description": "User uploads the front of the check"},
  {"page": "Deposit", "element": "Hold Banner", "event_type": "View", "trigger": "Banner text", "description": "User sees the hold notice"}
]"#;

// ============================================================================
// Helpers
// ============================================================================

/// Vision backend that checks it received the image and the fixed prompt.
struct RecordingVision {
    expected_image: Vec<u8>,
    response: String,
}

impl VisionInference for RecordingVision {
    fn describe_image(&self, image: &[u8], prompt: &str) -> Result<String, SourceError> {
        assert_eq!(image, self.expected_image.as_slice());
        assert_eq!(prompt, ANNOTATION_PROMPT);
        Ok(self.response.clone())
    }
}

fn annotate_one(source: &AnnotationSource, sink: &MemorySink) -> Vec<Event> {
    let image = b"png-bytes";
    let scope = TraceScope::new(sink, 1, "deposit.png", image, "annotation");
    source.annotate(image, &scope)
}

// ============================================================================
// 1. Response parsing: well-formed arrays
// ============================================================================

#[test]
fn parse_plain_array() {
    let records = try_parse_annotation_response(TWO_EVENTS).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].element, "Upload Front");
    assert_eq!(records[0].event_type, "Click");
    assert_eq!(records[1].page, "Deposit");
    assert_eq!(records[1].description, "User sees the hold notice");
}

#[test]
fn parse_empty_array() {
    assert!(try_parse_annotation_response("[]").unwrap().is_empty());
}

#[test]
fn parse_missing_fields_default_to_empty() {
    let records = try_parse_annotation_response(r#"[{"element": "Camera Icon"}]"#).unwrap();
    assert_eq!(
        records,
        vec![AnnotationRecord {
            element: "Camera Icon".into(),
            ..AnnotationRecord::default()
        }]
    );
}

#[test]
fn parse_null_and_number_fields() {
    let records =
        try_parse_annotation_response(r#"[{"element": "Pager", "event_type": null, "trigger": 3}]"#)
            .unwrap();
    assert_eq!(records[0].event_type, "");
    assert_eq!(records[0].trigger, "3");
}

// ============================================================================
// 2. Response parsing: recovery
// ============================================================================

#[test]
fn parse_markdown_fences() {
    let input = format!("```json\n{}\n```", TWO_EVENTS);
    let records = try_parse_annotation_response(&input).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn parse_preamble_text() {
    let input = format!("Here are the events I found:\n{}\nLet me know!", TWO_EVENTS);
    let records = try_parse_annotation_response(&input).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn parse_trailing_commas() {
    let input = r#"[{"element": "Submit Button", "event_type": "Click",},]"#;
    let records = try_parse_annotation_response(input).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].element, "Submit Button");
}

#[test]
fn parse_trailing_comma_inside_string_is_kept() {
    let input = r#"[{"element": "Menu", "description": "a, ]b",},]"#;
    let records = try_parse_annotation_response(input).unwrap();
    assert_eq!(records[0].description, "a, ]b");
}

#[test]
fn parse_wrapped_events_object() {
    let input = r#"{"events": [{"element": "Dropdown", "event_type": "Click"}]}"#;
    let records = try_parse_annotation_response(input).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].element, "Dropdown");
}

#[test]
fn parse_single_object() {
    let input = r#"{"element": "Hold Banner", "event_type": "View"}"#;
    let records = try_parse_annotation_response(input).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_type, "View");
}

#[test]
fn parse_skips_non_object_entries() {
    let input = r#"["noise", 4, {"element": "Camera Icon"}, {"unrelated": true}]"#;
    let records = try_parse_annotation_response(input).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].element, "Camera Icon");
}

#[test]
fn parse_any_single_wrapper_key() {
    let input = r#"{"interactions": [{"element": "Upload Button", "event_type": "Click", "trigger": "Upload label", "description": "uploads a check"}]}"#;
    let records = try_parse_annotation_response(input).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].element, "Upload Button");
    assert_eq!(records[0].event_type, "Click");
}

#[test]
fn parse_empty_events_wrapper() {
    assert!(try_parse_annotation_response(r#"{"events": []}"#).unwrap().is_empty());
}

#[test]
fn parse_keeps_string_fields_verbatim() {
    let records =
        try_parse_annotation_response(r#"[{"element": "  Upload Button ", "trigger": "tap\n"}]"#)
            .unwrap();
    assert_eq!(records[0].element, "  Upload Button ");
    assert_eq!(records[0].trigger, "tap\n");
}

// ============================================================================
// 3. Response parsing: garbage
// ============================================================================

#[test]
fn parse_garbage() {
    assert!(try_parse_annotation_response("this is not json at all").is_none());
}

#[test]
fn parse_empty_string() {
    assert!(try_parse_annotation_response("").is_none());
}

#[test]
fn parse_object_without_events() {
    assert!(try_parse_annotation_response(r#"{"status": "ok", "count": 3}"#).is_none());
    assert!(try_parse_annotation_response("{}").is_none());
    assert!(try_parse_annotation_response(r#"{"a": [], "b": []}"#).is_none());
}

#[test]
fn parse_array_without_event_entries() {
    assert!(try_parse_annotation_response(r#"["noise", 4, {"unrelated": true}]"#).is_none());
}

#[test]
fn parse_scalar_json() {
    assert!(try_parse_annotation_response("42").is_none());
    assert!(try_parse_annotation_response(r#"{"events": "none"}"#).is_none());
}

// ============================================================================
// 4. AnnotationSource mapping
// ============================================================================

#[test]
fn annotation_maps_records_to_events() {
    let source = AnnotationSource::with_mock_response(TWO_EVENTS);
    let sink = MemorySink::new();
    let events = annotate_one(&source, &sink);

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].element, "Upload Front");
    assert_eq!(events[0].event_type, EventType::Click);
    assert_eq!(events[0].trigger, "Upload front label");
    assert_eq!(events[1].event_type, EventType::View);

    let stages: Vec<TraceStage> = sink.events().into_iter().map(|e| e.stage).collect();
    assert_eq!(stages, vec![TraceStage::AnnotationReceived]);
}

#[test]
fn prompt_matches_json_object_mode() {
    assert!(ANNOTATION_PROMPT.contains(r#""events": ["#));
    assert!(ANNOTATION_PROMPT.contains("JSON object"));
}

#[test]
fn annotation_unwraps_unexpected_wrapper_key() {
    let source = AnnotationSource::with_mock_response(
        r#"{"interactions": [{"element": "Upload Button", "event_type": "Click"}]}"#,
    );
    let sink = MemorySink::new();
    let events = annotate_one(&source, &sink);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].element, "Upload Button");
    assert_eq!(sink.events()[0].stage, TraceStage::AnnotationReceived);
    assert_eq!(sink.events()[0].event_count, Some(1));
}

#[test]
fn object_without_events_is_traced_as_unparsed() {
    let source = AnnotationSource::with_mock_response(r#"{"status": "ok"}"#);
    let sink = MemorySink::new();
    let events = annotate_one(&source, &sink);

    assert!(events.is_empty());
    assert_eq!(sink.events()[0].stage, TraceStage::AnnotationUnparsed);
}

#[test]
fn annotation_keeps_unknown_event_types() {
    let source = AnnotationSource::with_mock_response(
        r#"[{"element": "Amount Field", "event_type": "Input"}, {"element": "Tab", "event_type": "click"}]"#,
    );
    let events = annotate_one(&source, &MemorySink::new());
    assert_eq!(events[0].event_type, EventType::Other("Input".into()));
    assert_eq!(events[1].event_type, EventType::Click);
}

#[test]
fn annotation_does_not_deduplicate() {
    let response = r#"[{"element": "Dropdown", "event_type": "Click"}, {"element": "Dropdown", "event_type": "Click"}]"#;
    let source = AnnotationSource::with_mock_response(response);
    let events = annotate_one(&source, &MemorySink::new());
    assert_eq!(events.len(), 2);
}

#[test]
fn annotation_sends_image_and_fixed_prompt() {
    let source = AnnotationSource::new(Box::new(RecordingVision {
        expected_image: b"png-bytes".to_vec(),
        response: "[]".into(),
    }));
    let events = annotate_one(&source, &MemorySink::new());
    assert!(events.is_empty());
}

#[test]
fn custom_prompt_is_forwarded() {
    struct PromptEcho;
    impl VisionInference for PromptEcho {
        fn describe_image(&self, _image: &[u8], prompt: &str) -> Result<String, SourceError> {
            Ok(format!(r#"[{{"element": "{}"}}]"#, prompt))
        }
    }

    let source = AnnotationSource::new(Box::new(PromptEcho)).with_prompt("Toolbar");
    let events = annotate_one(&source, &MemorySink::new());
    assert_eq!(events[0].element, "Toolbar");
}

// ============================================================================
// 5. AnnotationSource resilience
// ============================================================================

#[test]
fn service_failure_yields_empty_list() {
    let source = AnnotationSource::new(Box::new(MockVision::Unavailable));
    let sink = MemorySink::new();
    let events = annotate_one(&source, &sink);

    assert!(events.is_empty());
    let traces = sink.events();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].stage, TraceStage::AnnotationFailed);
    assert_eq!(traces[0].event_count, Some(0));
    assert_eq!(traces[0].image.as_deref(), Some("deposit.png"));
}

#[test]
fn malformed_response_yields_empty_list() {
    let source = AnnotationSource::with_mock_response("Sorry, I cannot help with that.");
    let sink = MemorySink::new();
    let events = annotate_one(&source, &sink);

    assert!(events.is_empty());
    assert_eq!(sink.events()[0].stage, TraceStage::AnnotationUnparsed);
}

#[test]
fn detect_never_errors_for_annotation() {
    let source = AnnotationSource::new(Box::new(MockVision::Unavailable));
    let sink = NullSink;
    let scope = TraceScope::new(&sink, 1, "a.png", b"x", "annotation");
    assert!(source.detect(b"x", &scope).unwrap().is_empty());
    assert_eq!(source.kind(), EventSourceKind::Annotation);
}

#[test]
fn failing_service_does_not_abort_batch() {
    let source = AnnotationSource::new(Box::new(MockVision::Unavailable));
    let images = vec![text_image("a.png", "x"), text_image("b.png", "y")];
    let outcome = tag_batch(&images, &source, &NullSink);

    assert!(outcome.skipped.is_empty());
    assert!(outcome.used_fallback());
    assert_eq!(outcome.events.len(), 1);
}

// ============================================================================
// 6. Batch variant
// ============================================================================

#[test]
fn annotate_all_concatenates_in_order() {
    struct ByImage;
    impl VisionInference for ByImage {
        fn describe_image(&self, image: &[u8], _prompt: &str) -> Result<String, SourceError> {
            match image {
                b"first" => Ok(r#"[{"element": "A"}, {"element": "B"}]"#.into()),
                b"broken" => Err(SourceError::VisionPayload("boom".into())),
                _ => Ok(r#"[{"element": "C"}, {"element": "A"}]"#.into()),
            }
        }
    }

    let source = AnnotationSource::new(Box::new(ByImage));
    let images = vec![
        ImageInput::new("1.png", b"first".to_vec()),
        ImageInput::new("2.png", b"broken".to_vec()),
        ImageInput::new("3.png", b"third".to_vec()),
    ];
    let sink = MemorySink::new();
    let events = source.annotate_all(&images, &sink);

    let names: Vec<&str> = events.iter().map(|e| e.element.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C", "A"]);

    let steps: Vec<(u64, TraceStage)> = sink.events().into_iter().map(|e| (e.step, e.stage)).collect();
    assert_eq!(
        steps,
        vec![
            (1, TraceStage::AnnotationReceived),
            (2, TraceStage::AnnotationFailed),
            (3, TraceStage::AnnotationReceived),
        ]
    );
}
