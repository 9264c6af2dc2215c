//! Fixed output precision applied at the serialization boundary.
//!
//! Scores and percentages are rounded to one decimal place, fractions, rates
//! and test statistics to four. Internal computations always keep full
//! precision; only `Serialize` impls go through these helpers.

use std::collections::BTreeMap;

use serde::Serializer;
use serde::ser::SerializeMap;

/// Decimal places for 0–100 scores and percentages.
pub const SCORE_PLACES: i32 = 1;
/// Decimal places for fractions, rates and statistics.
pub const FRACTION_PLACES: i32 = 4;

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn round_score(value: f64) -> f64 {
    round_to(value, SCORE_PLACES)
}

pub fn round_fraction(value: f64) -> f64 {
    round_to(value, FRACTION_PLACES)
}

pub fn serialize_score<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_score(*value))
}

pub fn serialize_fraction<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_fraction(*value))
}

pub fn serialize_optional_fraction<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&round_fraction(*v)),
        None => serializer.serialize_none(),
    }
}

pub fn serialize_fraction_map<K, S>(
    map: &BTreeMap<K, f64>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    K: serde::Serialize,
    S: Serializer,
{
    let mut out = serializer.serialize_map(Some(map.len()))?;
    for (key, value) in map {
        out.serialize_entry(key, &round_fraction(*value))?;
    }
    out.end()
}
