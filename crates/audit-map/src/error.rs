//! Error types for detector configuration.

use thiserror::Error;

/// Errors raised while building a [`crate::ColumnDetector`].
///
/// These are programmer errors in a field profile and surface when the
/// detector is constructed, never while detecting.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// Field name is empty.
    #[error("field config at position {index} has an empty name")]
    EmptyFieldName { index: usize },
    /// Two configs share a field name.
    #[error("duplicate field config: {0}")]
    DuplicateField(String),
    /// Pattern weight outside `[0, 1]`.
    #[error("pattern '{pattern}' for field '{field}' has weight {weight} outside [0, 1]")]
    InvalidWeight {
        field: String,
        pattern: String,
        weight: f64,
    },
    /// Pattern is not a valid regular expression.
    #[error("pattern '{pattern}' for field '{field}' is invalid: {source}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, DetectorError>;
