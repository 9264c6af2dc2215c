//! Analysis options.
//!
//! Every field has a default, so an options file only needs the values it
//! changes. Options are validated once before any work starts.

use std::path::Path;

use audit_model::ensure_in_range;
use audit_sample::SamplingMethod;
use audit_score::ScoringOptions;
use audit_stats::BenfordOptions;
use audit_validate::DEFAULT_OPTIONAL_WEIGHT_POOL;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Default |z| above which an amount is an outlier.
pub const DEFAULT_OUTLIER_Z_THRESHOLD: f64 = 3.0;

/// Which rows the sampler draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPopulation {
    #[default]
    All,
    /// Only rows flagged by at least one test.
    Flagged,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingOptions {
    /// Stratifier names, in key order.
    pub stratify_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_per_stratum: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub population: SamplingPopulation,
}

impl SamplingOptions {
    pub fn rate(stratify_by: Vec<String>, sample_rate: f64) -> Self {
        Self {
            stratify_by,
            sample_rate: Some(sample_rate),
            ..Self::default()
        }
    }

    pub fn fixed(stratify_by: Vec<String>, per_stratum: usize) -> Self {
        Self {
            stratify_by,
            fixed_per_stratum: Some(per_stratum),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_population(mut self, population: SamplingPopulation) -> Self {
        self.population = population;
        self
    }

    /// The draw method; exactly one of rate or fixed count must be set.
    pub fn method(&self) -> Result<SamplingMethod> {
        let method = match (self.sample_rate, self.fixed_per_stratum) {
            (Some(rate), None) => SamplingMethod::Rate(rate),
            (None, Some(count)) => SamplingMethod::FixedPerStratum(count),
            (Some(_), Some(_)) => {
                return Err(EngineError::InvalidOptions(
                    "sampling takes either sample_rate or fixed_per_stratum, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(EngineError::InvalidOptions(
                    "sampling needs sample_rate or fixed_per_stratum".to_string(),
                ));
            }
        };
        method.validate()?;
        Ok(method)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Column matches must score strictly above this.
    pub min_confidence: f64,
    pub optional_weight_pool: f64,
    pub scoring: ScoringOptions,
    pub benford: BenfordOptions,
    pub outlier_z_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingOptions>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            optional_weight_pool: DEFAULT_OPTIONAL_WEIGHT_POOL,
            scoring: ScoringOptions::default(),
            benford: BenfordOptions::default(),
            outlier_z_threshold: DEFAULT_OUTLIER_Z_THRESHOLD,
            sampling: None,
        }
    }
}

impl AnalysisOptions {
    /// Read options from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| EngineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringOptions) -> Self {
        self.scoring = scoring;
        self
    }

    #[must_use]
    pub fn with_benford(mut self, benford: BenfordOptions) -> Self {
        self.benford = benford;
        self
    }

    #[must_use]
    pub fn with_outlier_z_threshold(mut self, threshold: f64) -> Self {
        self.outlier_z_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: Option<SamplingOptions>) -> Self {
        self.sampling = sampling;
        self
    }

    /// Reject out-of-range values before any analysis runs.
    pub fn validate(&self) -> Result<()> {
        ensure_in_range("min_confidence", self.min_confidence, 0.0, 1.0)?;
        ensure_in_range("optional_weight_pool", self.optional_weight_pool, 0.0, 1.0)?;
        if self.scoring.multi_flag_threshold == 0 {
            return Err(EngineError::InvalidOptions(
                "multi_flag_threshold must be at least 1".to_string(),
            ));
        }
        ensure_in_range(
            "benford.min_magnitude_range",
            self.benford.min_magnitude_range,
            0.0,
            f64::MAX,
        )?;
        if !(self.outlier_z_threshold.is_finite() && self.outlier_z_threshold > 0.0) {
            return Err(EngineError::InvalidOptions(format!(
                "outlier_z_threshold must be positive, got {}",
                self.outlier_z_threshold
            )));
        }
        if let Some(sampling) = &self.sampling {
            if sampling.stratify_by.is_empty() {
                return Err(EngineError::InvalidOptions(
                    "sampling needs at least one stratify_by key".to_string(),
                ));
            }
            sampling.method()?;
        }
        Ok(())
    }
}
