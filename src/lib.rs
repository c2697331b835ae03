use crate::{
    aggregate::aggregator::{BatchOutcome, ImageInput, tag_batch},
    source::event_source::{EventSourceKind, SourceSettings, build_source},
    trace::logger::TraceSink,
};

pub mod aggregate;
pub mod cli;
pub mod report;
pub mod source;
pub mod tagging;
pub mod trace;

/// Tag a batch of `(filename, bytes)` screenshots with the selected source.
///
/// The returned events follow submission order, then discovery order within
/// each image, and are never empty: a batch with no detections yields the
/// single placeholder row.
pub fn tag_images(
    images: &[ImageInput],
    kind: EventSourceKind,
    settings: &SourceSettings,
    sink: &dyn TraceSink,
) -> BatchOutcome {
    let source = build_source(kind, settings);
    tag_batch(images, source.as_ref(), sink)
}
