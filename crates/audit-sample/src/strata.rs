//! Stratifiers and the built-in key helpers.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

type KeyFn<E> = Arc<dyn Fn(&E) -> String + Send + Sync>;

/// A named function that places an entry in a stratum.
pub struct Stratifier<E> {
    name: String,
    key: KeyFn<E>,
}

impl<E> Stratifier<E> {
    pub fn new(
        name: impl Into<String>,
        key: impl Fn(&E) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            key: Arc::new(key),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_for(&self, entry: &E) -> String {
        (self.key)(entry)
    }
}

impl<E> Clone for Stratifier<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            key: Arc::clone(&self.key),
        }
    }
}

impl<E> fmt::Debug for Stratifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stratifier")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Separator between the parts of a composite stratum key.
pub const KEY_SEPARATOR: &str = " | ";

/// Magnitude band of an amount (sign ignored).
pub fn amount_band(amount: f64) -> &'static str {
    let value = if amount.is_finite() { amount.abs() } else { 0.0 };
    if value < 1_000.0 {
        "<1K"
    } else if value < 10_000.0 {
        "1K-10K"
    } else if value < 100_000.0 {
        "10K-100K"
    } else if value < 1_000_000.0 {
        "100K-1M"
    } else {
        ">=1M"
    }
}

/// Calendar month of a date as `YYYY-MM`, or `unknown`.
pub fn month_key(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%Y-%m").to_string(),
        None => "unknown".to_string(),
    }
}
