//! Composite risk scoring.
//!
//! Folds the [`TestResult`]s of one analysis into a single 0 to 100 score,
//! a [`RiskTier`], severity counts and a short list of headline findings.

mod composite;

pub use composite::{
    CompositeScoreResult, DEFAULT_ENTITY_LABEL, DEFAULT_MULTI_FLAG_THRESHOLD,
    DEFAULT_TOP_FINDINGS_LIMIT, MULTI_FLAG_BOOST, Normalization, ScoringOptions,
    calculate_composite_score, score,
};

#[doc(no_inline)]
pub use audit_model::{RiskTier, TestResult};
