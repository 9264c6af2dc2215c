use std::collections::{BTreeMap, BTreeSet};

use audit_model::rounding::{serialize_fraction, serialize_score};
use audit_model::{RiskTier, Severity, TestResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_MULTI_FLAG_THRESHOLD: usize = 3;
pub const DEFAULT_TOP_FINDINGS_LIMIT: usize = 5;
pub const DEFAULT_ENTITY_LABEL: &str = "entries";

/// Score boost at 100% multi-flagged rows.
pub const MULTI_FLAG_BOOST: f64 = 0.25;

const MAX_SCORE: f64 = 100.0;

/// How the base score is normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Severity-weighted mean of per-test flag rates.
    #[default]
    MaxPossible,
    /// Severity-weighted flag count per entry.
    TotalEntries,
}

impl Normalization {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MaxPossible => "max_possible",
            Self::TotalEntries => "total_entries",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringOptions {
    pub normalization: Normalization,
    /// Distinct tests that must flag a row for it to count as multi-flagged.
    pub multi_flag_threshold: usize,
    pub top_findings_limit: usize,
    /// Noun used in findings ("entries", "payments", ...).
    pub entity_label: String,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            normalization: Normalization::default(),
            multi_flag_threshold: DEFAULT_MULTI_FLAG_THRESHOLD,
            top_findings_limit: DEFAULT_TOP_FINDINGS_LIMIT,
            entity_label: DEFAULT_ENTITY_LABEL.to_string(),
        }
    }
}

impl ScoringOptions {
    #[must_use]
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    #[must_use]
    pub fn with_multi_flag_threshold(mut self, threshold: usize) -> Self {
        self.multi_flag_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_top_findings_limit(mut self, limit: usize) -> Self {
        self.top_findings_limit = limit;
        self
    }

    #[must_use]
    pub fn with_entity_label(mut self, label: impl Into<String>) -> Self {
        self.entity_label = label.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScoreResult {
    #[serde(serialize_with = "serialize_score")]
    pub score: f64,
    pub risk_tier: RiskTier,
    pub tests_run: usize,
    pub total_entries: usize,
    /// Distinct rows flagged by at least one test.
    pub total_flagged: usize,
    #[serde(serialize_with = "serialize_fraction")]
    pub flag_rate: f64,
    pub flags_by_severity: BTreeMap<Severity, usize>,
    pub top_findings: Vec<String>,
    /// Rows flagged by at least `multi_flag_threshold` distinct test results.
    pub multi_flag_rows: usize,
    #[serde(serialize_with = "serialize_fraction")]
    pub multiplier: f64,
}

impl CompositeScoreResult {
    fn empty(tests_run: usize) -> Self {
        Self {
            score: 0.0,
            risk_tier: RiskTier::Low,
            tests_run,
            total_entries: 0,
            total_flagged: 0,
            flag_rate: 0.0,
            flags_by_severity: Severity::ALL.iter().map(|s| (*s, 0)).collect(),
            top_findings: Vec::new(),
            multi_flag_rows: 0,
            multiplier: 1.0,
        }
    }
}

/// Aggregate test results into one composite score.
pub fn calculate_composite_score(
    results: &[TestResult],
    total_entries: usize,
    options: &ScoringOptions,
) -> CompositeScoreResult {
    if total_entries == 0 {
        return CompositeScoreResult::empty(results.len());
    }
    let total = total_entries as f64;

    let base = match options.normalization {
        Normalization::MaxPossible => {
            let weight_sum: f64 = results.iter().map(|r| r.severity.weight()).sum();
            if weight_sum > 0.0 {
                let weighted: f64 = results
                    .iter()
                    .map(|r| r.flag_rate * r.severity.weight())
                    .sum();
                MAX_SCORE * weighted / weight_sum
            } else {
                0.0
            }
        }
        Normalization::TotalEntries => {
            let weighted: f64 = results
                .iter()
                .flat_map(|r| &r.flagged_entries)
                .map(|f| f.severity.weight())
                .sum();
            MAX_SCORE * weighted / total
        }
    };

    // Rows map to the positions of the results that flagged them.
    let mut tests_per_row: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    let mut flags_by_severity: BTreeMap<Severity, usize> =
        Severity::ALL.iter().map(|s| (*s, 0)).collect();
    for (position, result) in results.iter().enumerate() {
        for flag in &result.flagged_entries {
            tests_per_row
                .entry(flag.row_index)
                .or_default()
                .insert(position);
            *flags_by_severity.entry(flag.severity).or_default() += 1;
        }
    }

    let multi_flag_rows = tests_per_row
        .values()
        .filter(|tests| tests.len() >= options.multi_flag_threshold)
        .count();
    let multiplier = 1.0 + MULTI_FLAG_BOOST * multi_flag_rows as f64 / total;
    let score = (base * multiplier).clamp(0.0, MAX_SCORE);
    let total_flagged = tests_per_row.len();

    debug!(
        normalization = options.normalization.as_str(),
        base, multiplier, multi_flag_rows, "composite score components"
    );

    let risk_tier = RiskTier::from_score(score);
    info!(score, tier = risk_tier.as_str(), total_flagged, "composite score");

    CompositeScoreResult {
        score,
        risk_tier,
        tests_run: results.len(),
        total_entries,
        total_flagged,
        flag_rate: total_flagged as f64 / total,
        flags_by_severity,
        top_findings: top_findings(results, options),
        multi_flag_rows,
        multiplier,
    }
}

/// Aggregate with the default options and the given normalization.
pub fn score(
    results: &[TestResult],
    total_entries: usize,
    normalization: Normalization,
    multi_flag_threshold: usize,
) -> CompositeScoreResult {
    let options = ScoringOptions::default()
        .with_normalization(normalization)
        .with_multi_flag_threshold(multi_flag_threshold);
    calculate_composite_score(results, total_entries, &options)
}

fn top_findings(results: &[TestResult], options: &ScoringOptions) -> Vec<String> {
    let mut ranked: Vec<&TestResult> = results.iter().filter(|r| r.entries_flagged > 0).collect();
    // Stable sort keeps test order among equal rates.
    ranked.sort_by(|a, b| b.flag_rate.total_cmp(&a.flag_rate));
    ranked
        .into_iter()
        .take(options.top_findings_limit)
        .map(|r| {
            format!(
                "{}: {} {} flagged ({:.1}%)",
                r.test_name,
                r.entries_flagged,
                options.entity_label,
                r.flag_rate * 100.0
            )
        })
        .collect()
}
