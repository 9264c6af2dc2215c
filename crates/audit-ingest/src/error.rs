//! Error types for input loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading parsed input.
///
/// Malformed cell values are never errors; only an unreadable or
/// structurally invalid payload is.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read the input file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The payload is not valid JSON for the input contract.
    #[error("invalid input payload: {source}")]
    Payload {
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;
