//! Reproducible stratified sampling.
//!
//! Entries are partitioned by one or more named [`Stratifier`]s and each
//! stratum is drawn from its own ChaCha20 stream derived from the run seed
//! and the stratum key, so adding or removing a stratum never changes the
//! rows drawn from the others.

mod error;
mod sampler;
mod strata;

pub use error::{Result, SamplingError};
pub use sampler::{
    SampleRow, SamplingMethod, SamplingPlan, SamplingResult, SamplingStratum, SeedOrigin, preview,
    run,
};
pub use strata::{KEY_SEPARATOR, Stratifier, amount_band, month_key};
