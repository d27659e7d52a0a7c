use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TubeBatchError {
    #[error("No URL provided")]
    EmptyUrl,

    #[error("No videos found at {url}")]
    NoVideosFound { url: String },

    #[error("No destination folder selected")]
    NoDestination,

    #[error("Operator input closed")]
    InputClosed,

    #[error("Failed to start {program}: {source}")]
    ExtractorSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Extractor failed for {url}: {reason}")]
    ExtractorFailed { url: String, reason: String },

    #[error("Unexpected extractor output: {reason}")]
    MalformedOutput { reason: String },

    #[error("Transcript conversion failed for {path}: {reason}")]
    ConversionFailed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TubeBatchError>;
