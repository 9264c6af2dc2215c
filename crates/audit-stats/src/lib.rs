//! Statistical analyzers over ledger populations.
//!
//! Every analyzer is a pure function. Populations that are too small or too
//! narrow for a test produce a "not applicable" result rather than an error.

pub mod benford;
pub mod concentration;
pub mod outlier;

pub use benford::{
    BenfordAnalysis, BenfordOptions, ConformityLevel, analyze, analyze_with,
    expected_distribution, first_digit,
};
pub use concentration::{ConcentrationLevel, HhiResult, compute_hhi};
pub use outlier::{mean_and_std, z_score, zscore_to_severity};
