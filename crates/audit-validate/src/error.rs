//! Error types for quality profile configuration.

use audit_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QualityError {
    /// Two fields share a name.
    #[error("duplicate quality field: {0}")]
    DuplicateField(String),
    /// A weight, threshold or pool is outside its valid range.
    #[error("quality field '{field}': {source}")]
    OutOfRange {
        field: String,
        #[source]
        source: ModelError,
    },
    /// Template references a placeholder that is never substituted.
    #[error("quality field '{field}': unknown placeholder '{{{placeholder}}}' in issue template")]
    UnknownPlaceholder { field: String, placeholder: String },
}

pub type Result<T> = std::result::Result<T, QualityError>;
