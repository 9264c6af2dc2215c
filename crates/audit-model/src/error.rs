use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Reject values outside `[min, max]` (NaN is always rejected).
pub fn ensure_in_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_nan() || value < min || value > max {
        return Err(ModelError::OutOfRange {
            name: name.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}
