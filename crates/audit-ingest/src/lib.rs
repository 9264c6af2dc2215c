//! Input handling for ledger risk analysis.
//!
//! File parsing happens upstream; this crate only accepts rows that were
//! already extracted and turns individual cells into typed values.
//!
//! # Example
//!
//! ```ignore
//! use audit_ingest::{load_input, parse_amount, parse_date};
//!
//! let input = load_input(Path::new("extract.json"))?;
//! let first = &input.rows[0];
//! let amount = parse_amount(first.get("Amount"));
//! let posted = parse_date(first.get("Posting Date"));
//! ```

mod coerce;
mod error;
mod loader;

pub use coerce::{
    format_number, is_missing, parse_amount, parse_amount_str, parse_date, parse_date_str,
    parse_optional_amount, parse_text,
};
pub use error::{IngestError, Result};
pub use loader::{load_input, parse_input, read_input, reconcile_columns};
