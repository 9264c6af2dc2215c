//! Severity levels, risk tiers and test tiers.
//!
//! These enums are the shared vocabulary for every analyzer and scorer. They
//! serialize to lowercase strings so the JSON contract stays stable, but the
//! rest of the workspace works with the enums directly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a single flag or of a test as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Fixed scoring weight used by the composite scorer.
    pub fn weight(self) -> f64 {
        match self {
            Self::High => 3.0,
            Self::Medium => 2.0,
            Self::Low => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse banding of a composite score for reporting.
///
/// Variants are declared from least to most severe so that `Ord` follows
/// risk, which lets callers write `tier >= RiskTier::High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Elevated,
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    /// Upper (exclusive) score bound of each tier below `Critical`.
    pub const BREAKPOINTS: [(f64, RiskTier); 4] = [
        (10.0, RiskTier::Low),
        (25.0, RiskTier::Elevated),
        (50.0, RiskTier::Moderate),
        (75.0, RiskTier::High),
    ];

    /// Map a 0–100 score onto a tier.
    ///
    /// NaN and negative scores land in `Low`.
    pub fn from_score(score: f64) -> Self {
        if score.is_nan() {
            return Self::Low;
        }
        for (bound, tier) in Self::BREAKPOINTS {
            if score < bound {
                return tier;
            }
        }
        Self::Critical
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Elevated => "elevated",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convenience alias for [`RiskTier::from_score`].
pub fn score_to_risk_tier(score: f64) -> RiskTier {
    RiskTier::from_score(score)
}

/// Family a test belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestTier {
    /// Shape and completeness checks on individual rows.
    Structural,
    /// Population-level statistics (Benford, outliers, concentration).
    Statistical,
    /// Cross-row pattern analysis.
    Advanced,
    /// Checks against contractual or policy terms.
    Contract,
}

impl TestTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Statistical => "statistical",
            Self::Advanced => "advanced",
            Self::Contract => "contract",
        }
    }
}

impl fmt::Display for TestTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
