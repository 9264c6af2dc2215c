//! Error types for engine construction and analysis options.

use std::path::PathBuf;

use audit_map::DetectorError;
use audit_model::ModelError;
use audit_sample::SamplingError;
use audit_validate::QualityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Quality(#[from] QualityError),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error("invalid analysis option: {0}")]
    Option(#[from] ModelError),
    #[error("invalid analysis option: {0}")]
    InvalidOptions(String),
    #[error("duplicate test key: {0}")]
    DuplicateTest(String),
    #[error("failed to read options file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse options file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
