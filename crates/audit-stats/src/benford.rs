//! First-digit (Benford's Law) analysis.
//!
//! Naturally occurring monetary amounts that span several orders of
//! magnitude have leading digits distributed as `log10(1 + 1/d)`. Large
//! departures, measured by the mean absolute deviation, suggest invented or
//! threshold-driven figures.

use std::collections::BTreeMap;

use audit_model::rounding::{serialize_fraction, serialize_fraction_map};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default minimum number of eligible amounts.
pub const DEFAULT_MIN_ENTRIES: usize = 500;
/// Default minimum spread in orders of magnitude.
pub const DEFAULT_MIN_MAGNITUDE_RANGE: f64 = 2.0;

/// Most-deviated digits reported at most.
const MAX_DEVIATED_DIGITS: usize = 3;

/// Preconditions for a meaningful Benford test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenfordOptions {
    pub min_entries: usize,
    pub min_magnitude_range: f64,
}

impl Default for BenfordOptions {
    fn default() -> Self {
        Self {
            min_entries: DEFAULT_MIN_ENTRIES,
            min_magnitude_range: DEFAULT_MIN_MAGNITUDE_RANGE,
        }
    }
}

/// Nigrini conformity bands for first-digit MAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConformityLevel {
    Conforming,
    Acceptable,
    MarginallyAcceptable,
    Nonconforming,
}

impl ConformityLevel {
    pub fn from_mad(mad: f64) -> Self {
        if mad < 0.006 {
            Self::Conforming
        } else if mad < 0.012 {
            Self::Acceptable
        } else if mad < 0.015 {
            Self::MarginallyAcceptable
        } else {
            Self::Nonconforming
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conforming => "conforming",
            Self::Acceptable => "acceptable",
            Self::MarginallyAcceptable => "marginally_acceptable",
            Self::Nonconforming => "nonconforming",
        }
    }

    /// Marginal or worse.
    pub fn is_suspicious(self) -> bool {
        self >= Self::MarginallyAcceptable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenfordAnalysis {
    pub passed_prechecks: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precheck_message: Option<String>,
    pub total_count: usize,
    pub eligible_count: usize,
    #[serde(serialize_with = "serialize_fraction_map")]
    pub expected_distribution: BTreeMap<u8, f64>,
    #[serde(serialize_with = "serialize_fraction_map")]
    pub actual_distribution: BTreeMap<u8, f64>,
    #[serde(serialize_with = "serialize_fraction_map")]
    pub deviation_by_digit: BTreeMap<u8, f64>,
    #[serde(serialize_with = "serialize_fraction")]
    pub mad: f64,
    #[serde(serialize_with = "serialize_fraction")]
    pub chi_squared: f64,
    pub conformity_level: Option<ConformityLevel>,
    pub most_deviated_digits: Vec<u8>,
}

impl BenfordAnalysis {
    fn not_applicable(total_count: usize, eligible_count: usize, message: String) -> Self {
        debug!(total_count, eligible_count, %message, "benford prechecks failed");
        Self {
            passed_prechecks: false,
            precheck_message: Some(message),
            total_count,
            eligible_count,
            expected_distribution: expected_distribution(),
            actual_distribution: BTreeMap::new(),
            deviation_by_digit: BTreeMap::new(),
            mad: 0.0,
            chi_squared: 0.0,
            conformity_level: None,
            most_deviated_digits: Vec::new(),
        }
    }

    /// Most-deviated digits that occur more often than expected.
    pub fn over_represented_digits(&self) -> Vec<u8> {
        self.most_deviated_digits
            .iter()
            .copied()
            .filter(|d| self.deviation_by_digit.get(d).is_some_and(|dev| *dev > 0.0))
            .collect()
    }
}

/// Expected share of each leading digit 1..=9.
pub fn expected_distribution() -> BTreeMap<u8, f64> {
    (1..=9u8)
        .map(|d| (d, (1.0 + 1.0 / f64::from(d)).log10()))
        .collect()
}

/// First significant digit of a positive finite amount.
pub fn first_digit(value: f64) -> Option<u8> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    // Scientific notation puts the leading significant digit first without
    // the drift of repeated division.
    let digit = format!("{value:e}").bytes().next()?.checked_sub(b'0')?;
    (1..=9).contains(&digit).then_some(digit)
}

/// Run the first-digit test with default preconditions.
pub fn analyze(amounts: &[f64], total_count: usize) -> BenfordAnalysis {
    analyze_with(amounts, total_count, BenfordOptions::default())
}

/// Run the first-digit test.
///
/// Only positive finite amounts are eligible. When fewer than
/// `min_entries` are eligible, or they span less than
/// `min_magnitude_range` orders of magnitude, the result is marked as not
/// applicable instead of failing.
pub fn analyze_with(
    amounts: &[f64],
    total_count: usize,
    options: BenfordOptions,
) -> BenfordAnalysis {
    let digits: Vec<u8> = amounts.iter().filter_map(|a| first_digit(*a)).collect();
    let eligible_count = digits.len();

    if eligible_count < options.min_entries {
        return BenfordAnalysis::not_applicable(
            total_count,
            eligible_count,
            format!(
                "Benford analysis needs at least {} positive amounts; found {}",
                options.min_entries, eligible_count
            ),
        );
    }

    let (min, max) = amounts
        .iter()
        .copied()
        .filter(|a| a.is_finite() && *a > 0.0)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), a| {
            (lo.min(a), hi.max(a))
        });
    let range = max.log10() - min.log10();
    if range.is_nan() || range < options.min_magnitude_range {
        return BenfordAnalysis::not_applicable(
            total_count,
            eligible_count,
            format!(
                "Amounts span {:.2} orders of magnitude; at least {:.1} are needed",
                range.max(0.0),
                options.min_magnitude_range
            ),
        );
    }

    let mut counts = [0usize; 10];
    for digit in &digits {
        counts[usize::from(*digit)] += 1;
    }

    let n = eligible_count as f64;
    let expected = expected_distribution();
    let mut actual = BTreeMap::new();
    let mut deviation = BTreeMap::new();
    let mut abs_total = 0.0;
    let mut chi_squared = 0.0;
    for (&digit, &expected_share) in &expected {
        let observed = counts[usize::from(digit)] as f64;
        let share = observed / n;
        let expected_count = expected_share * n;
        chi_squared += (observed - expected_count).powi(2) / expected_count;
        abs_total += (share - expected_share).abs();
        actual.insert(digit, share);
        deviation.insert(digit, share - expected_share);
    }
    let mad = abs_total / expected.len() as f64;
    let conformity = ConformityLevel::from_mad(mad);

    let mut ranked: Vec<(u8, f64)> = deviation
        .iter()
        .map(|(d, dev)| (*d, dev.abs()))
        .filter(|(_, abs)| *abs > mad)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let most_deviated: Vec<u8> = ranked
        .into_iter()
        .take(MAX_DEVIATED_DIGITS)
        .map(|(d, _)| d)
        .collect();

    debug!(
        eligible_count,
        mad,
        chi_squared,
        conformity = conformity.as_str(),
        "benford analysis complete"
    );

    BenfordAnalysis {
        passed_prechecks: true,
        precheck_message: None,
        total_count,
        eligible_count,
        expected_distribution: expected,
        actual_distribution: actual,
        deviation_by_digit: deviation,
        mad,
        chi_squared,
        conformity_level: Some(conformity),
        most_deviated_digits: most_deviated,
    }
}
