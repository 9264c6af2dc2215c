//! Column detection types.
//!
//! This module provides the field configuration a domain module declares
//! up front and the detection result produced once per uploaded file.

use std::collections::{BTreeMap, BTreeSet};

use audit_model::rounding::serialize_fraction;
use serde::{Deserialize, Serialize};

/// One weighted header pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPattern {
    /// Regular expression matched against the lowercased, trimmed header.
    pub pattern: String,
    /// Match score (0.0 to 1.0) when the pattern matches.
    pub weight: f64,
    /// Anchor the pattern to the start of the header instead of searching.
    #[serde(default)]
    pub exact: bool,
}

impl ColumnPattern {
    /// Pattern anchored to the start of the header.
    pub fn exact(pattern: impl Into<String>, weight: f64) -> Self {
        Self {
            pattern: pattern.into(),
            weight,
            exact: true,
        }
    }

    /// Pattern that may match anywhere in the header.
    pub fn partial(pattern: impl Into<String>, weight: f64) -> Self {
        Self {
            pattern: pattern.into(),
            weight,
            exact: false,
        }
    }
}

/// Declares how one semantic field is recognised among raw headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFieldConfig {
    /// Semantic field identifier (e.g. "posting_date").
    pub field_name: String,
    /// Ordered patterns; the highest matching weight wins.
    pub patterns: Vec<ColumnPattern>,
    /// Whether a missing assignment should be reported.
    #[serde(default)]
    pub required: bool,
    /// Note appended to the detection notes when a required field is unassigned.
    #[serde(default)]
    pub missing_note: String,
    /// Assignment order; lower values claim columns first.
    #[serde(default)]
    pub priority: i32,
}

impl ColumnFieldConfig {
    pub fn new(field_name: impl Into<String>, priority: i32) -> Self {
        Self {
            field_name: field_name.into(),
            patterns: Vec::new(),
            required: false,
            missing_note: String::new(),
            priority,
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: ColumnPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    #[must_use]
    pub fn exact(self, pattern: &str, weight: f64) -> Self {
        self.with_pattern(ColumnPattern::exact(pattern, weight))
    }

    #[must_use]
    pub fn partial(self, pattern: &str, weight: f64) -> Self {
        self.with_pattern(ColumnPattern::partial(pattern, weight))
    }

    /// Mark the field as required, with the note reported when it is missing.
    #[must_use]
    pub fn required(mut self, missing_note: impl Into<String>) -> Self {
        self.required = true;
        self.missing_note = missing_note.into();
        self
    }
}

/// How an assignment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    /// Chosen by pattern scoring.
    Detected,
    /// Supplied by the caller's column mapping.
    Override,
}

/// A column claimed by a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAssignment {
    pub column: String,
    #[serde(serialize_with = "serialize_fraction")]
    pub confidence: f64,
    pub source: AssignmentSource,
}

/// Result of column detection for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Field name to assigned column.
    pub assignments: BTreeMap<String, ColumnAssignment>,
    /// Headers in file order.
    pub all_columns: Vec<String>,
    /// Human-readable notes (missing required fields, overrides applied).
    pub detection_notes: Vec<String>,
    /// Required fields that ended without a column.
    #[serde(default)]
    pub missing_required: Vec<String>,
}

impl DetectionResult {
    /// Column assigned to a field, if any.
    pub fn column_for(&self, field: &str) -> Option<&str> {
        self.assignments.get(field).map(|a| a.column.as_str())
    }

    pub fn confidence_for(&self, field: &str) -> Option<f64> {
        self.assignments.get(field).map(|a| a.confidence)
    }

    pub fn is_assigned(&self, field: &str) -> bool {
        self.assignments.contains_key(field)
    }

    /// True when every required field found a column.
    pub fn has_all_required(&self) -> bool {
        self.missing_required.is_empty()
    }

    /// Columns no field claimed, in file order.
    pub fn unmapped_columns(&self) -> Vec<&str> {
        let claimed: BTreeSet<&str> = self
            .assignments
            .values()
            .map(|a| a.column.as_str())
            .collect();
        self.all_columns
            .iter()
            .map(String::as_str)
            .filter(|c| !claimed.contains(c))
            .collect()
    }
}
