/// Failures surfaced by the command layer.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    ReadInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteOutput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown event source '{0}' (expected heuristic or annotation)")]
    UnknownSource(String),

    #[error("unknown output format '{0}' (expected console, csv, html or json)")]
    UnknownFormat(String),

    #[error("no images given")]
    NoImages,

    #[error("JSON serialize error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
