//! Stratified sampling with reproducible per-stratum random streams.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::index;
use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Result, SamplingError};
use crate::strata::{KEY_SEPARATOR, Stratifier};

/// Anything that can be sampled must point back at its source row.
pub trait SampleRow {
    fn row_index(&self) -> usize;
}

impl<T: SampleRow + ?Sized> SampleRow for &T {
    fn row_index(&self) -> usize {
        (**self).row_index()
    }
}

/// How many rows to draw from each stratum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMethod {
    /// Fraction of each stratum, at least one row.
    Rate(f64),
    /// Fixed count per stratum, capped at the stratum size.
    FixedPerStratum(usize),
}

impl SamplingMethod {
    pub fn validate(self) -> Result<()> {
        match self {
            Self::Rate(rate) if rate.is_nan() || rate <= 0.0 || rate > 1.0 => {
                Err(SamplingError::InvalidRate(rate))
            }
            Self::FixedPerStratum(0) => Err(SamplingError::ZeroFixedCount),
            _ => Ok(()),
        }
    }

    /// Rows drawn from a stratum of `population` rows.
    ///
    /// Rates round half to even (2.5 draws 2, 3.5 draws 4), never below one
    /// row and never above the population.
    pub fn sample_size(self, population: usize) -> usize {
        if population == 0 {
            return 0;
        }
        let wanted = match self {
            Self::Rate(rate) => ((population as f64 * rate).round_ties_even() as usize).max(1),
            Self::FixedPerStratum(count) => count,
        };
        wanted.min(population)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOrigin {
    /// Supplied by the caller.
    Provided,
    /// Drawn from the thread CSPRNG for this run.
    Generated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingStratum {
    pub key: String,
    pub population_size: usize,
    pub sample_size: usize,
    pub sampled_row_ids: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingResult {
    pub seed: u64,
    pub seed_origin: SeedOrigin,
    pub method: SamplingMethod,
    pub stratify_by: Vec<String>,
    pub strata: Vec<SamplingStratum>,
    pub total_population: usize,
    pub total_sampled: usize,
    /// Union of all strata, ascending.
    pub sampled_row_ids: Vec<usize>,
}

/// A validated sampling configuration.
#[derive(Debug)]
pub struct SamplingPlan<E> {
    stratifiers: Vec<Stratifier<E>>,
    method: SamplingMethod,
    seed: Option<u64>,
}

impl<E: SampleRow> SamplingPlan<E> {
    pub fn new(stratifiers: Vec<Stratifier<E>>, method: SamplingMethod) -> Result<Self> {
        if stratifiers.is_empty() {
            return Err(SamplingError::NoStratifiers);
        }
        let mut seen = BTreeSet::new();
        for stratifier in &stratifiers {
            if !seen.insert(stratifier.name()) {
                return Err(SamplingError::DuplicateStratifier(stratifier.name().to_string()));
            }
        }
        method.validate()?;
        Ok(Self {
            stratifiers,
            method,
            seed: None,
        })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn method(&self) -> SamplingMethod {
        self.method
    }

    pub fn stratify_by(&self) -> Vec<String> {
        self.stratifiers.iter().map(|s| s.name().to_string()).collect()
    }

    fn stratum_key(&self, entry: &E) -> String {
        self.stratifiers
            .iter()
            .map(|s| s.key_for(entry))
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
    }

    /// Group row ids by stratum key, keeping population order within each.
    fn partition<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a E>,
    ) -> BTreeMap<String, Vec<usize>>
    where
        E: 'a,
    {
        let mut strata: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for entry in entries {
            strata
                .entry(self.stratum_key(entry))
                .or_default()
                .push(entry.row_index());
        }
        strata
    }

    /// Stratum sizes and planned sample sizes, without drawing.
    pub fn preview<'a>(&self, entries: impl IntoIterator<Item = &'a E>) -> Vec<SamplingStratum>
    where
        E: 'a,
    {
        self.partition(entries)
            .into_iter()
            .map(|(key, rows)| SamplingStratum {
                key,
                population_size: rows.len(),
                sample_size: self.method.sample_size(rows.len()),
                sampled_row_ids: Vec::new(),
            })
            .collect()
    }

    /// Draw the sample.
    ///
    /// The same seed over the same ordered population always yields the
    /// same row ids. Without a seed one is generated and reported.
    pub fn run<'a>(&self, entries: impl IntoIterator<Item = &'a E>) -> SamplingResult
    where
        E: 'a,
    {
        let (seed, seed_origin) = match self.seed {
            Some(seed) => (seed, SeedOrigin::Provided),
            None => (rand::rng().random::<u64>(), SeedOrigin::Generated),
        };

        let mut strata = Vec::new();
        let mut total_population = 0;
        let mut all_sampled = Vec::new();
        for (key, rows) in self.partition(entries) {
            let sample_size = self.method.sample_size(rows.len());
            let mut rng = stratum_rng(seed, &key);
            let mut sampled: Vec<usize> = index::sample(&mut rng, rows.len(), sample_size)
                .into_iter()
                .map(|i| rows[i])
                .collect();
            sampled.sort_unstable();
            debug!(stratum = %key, population = rows.len(), sample_size, "stratum sampled");

            total_population += rows.len();
            all_sampled.extend_from_slice(&sampled);
            strata.push(SamplingStratum {
                key,
                population_size: rows.len(),
                sample_size,
                sampled_row_ids: sampled,
            });
        }
        all_sampled.sort_unstable();
        all_sampled.dedup();

        info!(
            seed,
            strata = strata.len(),
            total_population,
            total_sampled = all_sampled.len(),
            "sample drawn"
        );

        SamplingResult {
            seed,
            seed_origin,
            method: self.method,
            stratify_by: self.stratify_by(),
            strata,
            total_population,
            total_sampled: all_sampled.len(),
            sampled_row_ids: all_sampled,
        }
    }
}

/// Independent stream per stratum: ChaCha20 keyed by SHA-256(seed || key).
fn stratum_rng(seed: u64, key: &str) -> ChaCha20Rng {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(key.as_bytes());
    ChaCha20Rng::from_seed(hasher.finalize().into())
}

/// Preview strata sizes for `entries`.
pub fn preview<E: SampleRow>(
    entries: &[E],
    stratify_by: Vec<Stratifier<E>>,
    method: SamplingMethod,
) -> Result<Vec<SamplingStratum>> {
    Ok(SamplingPlan::new(stratify_by, method)?.preview(entries))
}

/// Draw a stratified sample from `entries`.
pub fn run<E: SampleRow>(
    entries: &[E],
    stratify_by: Vec<Stratifier<E>>,
    method: SamplingMethod,
    seed: Option<u64>,
) -> Result<SamplingResult> {
    Ok(SamplingPlan::new(stratify_by, method)?
        .with_seed(seed)
        .run(entries))
}
