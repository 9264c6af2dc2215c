//! Analysis engine for ledger anomaly detection.
//!
//! This crate wires the building blocks together: column detection, entry
//! building, data quality, anomaly tests, composite scoring and sampling.
//! Domain modules plug in by implementing [`AuditTest`] (or wrapping a
//! function in [`FnTest`]) and registering it on an [`AuditEngine`].
//!
//! # Example
//!
//! ```ignore
//! use audit_core::{AnalysisOptions, ledger};
//!
//! let engine = ledger::engine()?;
//! let report = engine.run(&input, &AnalysisOptions::default())?;
//! println!("{} ({})", report.composite_score.score, report.risk_tier());
//! ```

mod audit_test;
mod engine;
mod error;
pub mod ledger;
mod options;
mod statistical;

pub use audit_test::{AuditEntry, AuditTest, FnTest, TestConfig};
pub use engine::{AnalysisReport, AuditEngine, RowView, SkippedTest};
pub use error::{EngineError, Result};
pub use options::{
    AnalysisOptions, DEFAULT_OUTLIER_Z_THRESHOLD, SamplingOptions, SamplingPopulation,
};
pub use statistical::{
    BenfordTest, CompletenessTest, ConcentrationTest, ZScoreOutlierTest, benford_test,
    completeness_test, concentration_test, zscore_outlier_test,
};
