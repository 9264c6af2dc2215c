//! Error types for sampling plans.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("sampling plan needs at least one stratifier")]
    NoStratifiers,
    #[error("duplicate stratifier: {0}")]
    DuplicateStratifier(String),
    #[error("unknown stratifier: {0}")]
    UnknownStratifier(String),
    #[error("sample rate must be greater than 0 and at most 1, got {0}")]
    InvalidRate(f64),
    #[error("fixed sample size per stratum must be at least 1")]
    ZeroFixedCount,
}

pub type Result<T> = std::result::Result<T, SamplingError>;
