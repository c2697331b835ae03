use std::process::ExitStatus;

/// Failure while turning one image into events.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// OCR subprocess could not be started
    #[error("failed to spawn {program} (is it installed?): {source}")]
    OcrSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing image bytes to the OCR subprocess failed
    #[error("failed to feed image to {program}: {source}")]
    OcrInput {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// OCR subprocess exited with non-zero status
    #[error("{program} exited with {status}: {stderr}")]
    OcrFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Image could not be read before OCR
    #[error("unreadable image: {0}")]
    UnreadableImage(String),

    /// Vision service could not be reached
    #[error("vision request failed: {0}")]
    VisionTransport(#[from] reqwest::Error),

    /// Vision service answered with a non-success status
    #[error("vision service returned HTTP {status}: {body}")]
    VisionStatus { status: u16, body: String },

    /// Vision service answered with something other than the expected envelope
    #[error("unexpected vision payload: {0}")]
    VisionPayload(String),
}
