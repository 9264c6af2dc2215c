//! Data quality assessment for typed ledger entries.
//!
//! A [`QualityProfile`] is built once per domain from field accessors and
//! reused for every file; [`QualityProfile::assess`] never fails on data.

mod error;
mod quality;

pub use error::{QualityError, Result};
pub use quality::{
    DEFAULT_OPTIONAL_WEIGHT_POOL, DataQualityResult, FieldQualityConfig, QualityProfile, assess,
};
