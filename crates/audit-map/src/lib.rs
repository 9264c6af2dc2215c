//! Column-role detection for ledger extracts of unknown layout.
//!
//! Each domain declares a profile of [`ColumnFieldConfig`]s. The
//! [`ColumnDetector`] compiles the profile once and then maps the raw headers
//! of every uploaded file onto semantic fields.
//!
//! # Example
//!
//! ```ignore
//! use audit_map::{ColumnDetector, profiles};
//!
//! let detector = ColumnDetector::new(profiles::journal_entry())?;
//! let result = detector.detect(&headers, 0.0);
//! for note in &result.detection_notes {
//!     println!("{note}");
//! }
//! ```

#![deny(unsafe_code)]

mod engine;
mod error;
pub mod profiles;
mod types;
mod utils;

pub use engine::{ColumnDetector, OVERRIDE_CONFIDENCE, detect_columns};
pub use error::{DetectorError, Result};
pub use types::{
    AssignmentSource, ColumnAssignment, ColumnFieldConfig, ColumnPattern, DetectionResult,
};
pub use utils::{find_column, normalize_header};
