use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::rounding::{serialize_fraction, serialize_optional_fraction};
use crate::severity::{Severity, TestTier};

/// A single row flagged by one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedEntry {
    /// Zero-based position of the row in the analysed population.
    pub row_index: usize,
    /// Source document or entry number, when one was detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    pub severity: Severity,
    pub reason: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_fraction"
    )]
    pub amount: Option<f64>,
}

impl FlaggedEntry {
    pub fn new(row_index: usize, severity: Severity, reason: impl Into<String>) -> Self {
        Self {
            row_index,
            entry_id: None,
            severity,
            reason: reason.into(),
            amount: None,
        }
    }

    #[must_use]
    pub fn with_entry_id(mut self, entry_id: Option<String>) -> Self {
        self.entry_id = entry_id;
        self
    }

    #[must_use]
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// Outcome of running one test function over a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Stable snake_case identifier.
    pub test_key: String,
    /// Display name used in findings.
    pub test_name: String,
    pub tier: TestTier,
    /// Severity of the test as a whole.
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    pub entries_flagged: usize,
    #[serde(serialize_with = "serialize_fraction")]
    pub flag_rate: f64,
    pub flagged_entries: Vec<FlaggedEntry>,
}

impl TestResult {
    /// Build a result, deriving `entries_flagged` and `flag_rate` from the flags.
    ///
    /// `entries_flagged` counts distinct rows, so a test that emits two flags
    /// for the same row still reports one flagged entry.
    pub fn new(
        test_key: impl Into<String>,
        test_name: impl Into<String>,
        tier: TestTier,
        severity: Severity,
        total_entries: usize,
        flagged_entries: Vec<FlaggedEntry>,
    ) -> Self {
        let entries_flagged = flagged_entries
            .iter()
            .map(|flag| flag.row_index)
            .collect::<BTreeSet<_>>()
            .len();
        let flag_rate = if total_entries == 0 {
            0.0
        } else {
            entries_flagged as f64 / total_entries as f64
        };
        Self {
            test_key: test_key.into(),
            test_name: test_name.into(),
            tier,
            severity,
            description: String::new(),
            entries_flagged,
            flag_rate,
            flagged_entries,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Distinct row indices flagged by this test.
    pub fn flagged_rows(&self) -> BTreeSet<usize> {
        self.flagged_entries.iter().map(|f| f.row_index).collect()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.flagged_entries
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}
