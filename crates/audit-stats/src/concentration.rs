//! Herfindahl-Hirschman concentration index.

use audit_model::rounding::{serialize_fraction, serialize_score};
use serde::{Deserialize, Serialize};

/// Upper bound of the index (a single entity holding everything).
pub const MAX_HHI: f64 = 10_000.0;
const MODERATE_FLOOR: f64 = 1_500.0;
const CONCENTRATED_FLOOR: f64 = 2_500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcentrationLevel {
    Competitive,
    Moderate,
    Concentrated,
}

impl ConcentrationLevel {
    /// Below 1500 competitive, 1500 to 2500 moderate, above 2500 concentrated.
    pub fn from_hhi(hhi: f64) -> Self {
        if hhi > CONCENTRATED_FLOOR {
            Self::Concentrated
        } else if hhi >= MODERATE_FLOOR {
            Self::Moderate
        } else {
            Self::Competitive
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Competitive => "competitive",
            Self::Moderate => "moderate",
            Self::Concentrated => "concentrated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HhiResult {
    #[serde(serialize_with = "serialize_fraction")]
    pub hhi: f64,
    pub concentration_level: ConcentrationLevel,
    /// Largest entity's share, as a percentage.
    #[serde(serialize_with = "serialize_score")]
    pub top_share_pct: f64,
    /// Number of equally sized entities that would give the same index.
    #[serde(serialize_with = "serialize_fraction")]
    pub effective_n: f64,
    /// Entities with a positive share.
    pub entity_count: usize,
}

impl HhiResult {
    fn empty() -> Self {
        Self {
            hhi: 0.0,
            concentration_level: ConcentrationLevel::Competitive,
            top_share_pct: 0.0,
            effective_n: 0.0,
            entity_count: 0,
        }
    }
}

/// Compute the HHI of raw shares (amounts, counts or fractions).
///
/// Non-positive and non-finite shares are ignored. The remaining shares are
/// normalized to percentages before squaring. Shares are rescaled by the
/// largest one first, so very large amounts cannot overflow the total.
pub fn compute_hhi(shares: &[f64]) -> HhiResult {
    let positive: Vec<f64> = shares
        .iter()
        .copied()
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();
    match positive.len() {
        0 => return HhiResult::empty(),
        1 => {
            return HhiResult {
                hhi: MAX_HHI,
                concentration_level: ConcentrationLevel::Concentrated,
                top_share_pct: 100.0,
                effective_n: 1.0,
                entity_count: 1,
            };
        }
        _ => {}
    }

    let largest = positive.iter().copied().fold(0.0, f64::max);
    let scaled: Vec<f64> = positive.iter().map(|s| s / largest).collect();
    let total: f64 = scaled.iter().sum();

    let pct: Vec<f64> = scaled.iter().map(|s| s / total * 100.0).collect();
    let hhi = pct.iter().map(|p| p * p).sum::<f64>().min(MAX_HHI);
    let top_share_pct = 100.0 / total;

    HhiResult {
        hhi,
        concentration_level: ConcentrationLevel::from_hhi(hhi),
        top_share_pct,
        effective_n: if hhi > 0.0 { MAX_HHI / hhi } else { 0.0 },
        entity_count: positive.len(),
    }
}
