//! Column detector implementation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{DetectorError, Result};
use crate::types::{AssignmentSource, ColumnAssignment, ColumnFieldConfig, DetectionResult};
use crate::utils::{find_column, normalize_header};

/// Confidence given to caller-supplied column mappings.
pub const OVERRIDE_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Clone)]
struct CompiledPattern {
    regex: Regex,
    weight: f64,
}

#[derive(Debug, Clone)]
struct CompiledField {
    config: ColumnFieldConfig,
    patterns: Vec<CompiledPattern>,
}

impl CompiledField {
    fn score(&self, normalized: &str) -> f64 {
        self.patterns
            .iter()
            .filter(|p| p.regex.is_match(normalized))
            .map(|p| p.weight)
            .fold(0.0, f64::max)
    }
}

/// Maps raw headers to semantic fields using weighted patterns.
///
/// Fields are processed in ascending priority and each greedily claims the
/// best remaining column, so a generic pattern on a late field (such as
/// "amount") cannot take a column a more specific, earlier field (such as
/// "credit") should own. Every column is assigned to at most one field.
#[derive(Debug, Clone)]
pub struct ColumnDetector {
    fields: Vec<CompiledField>,
}

impl ColumnDetector {
    /// Compile a field profile.
    ///
    /// Fails on empty or duplicate field names, weights outside `[0, 1]` and
    /// invalid regular expressions.
    pub fn new(configs: Vec<ColumnFieldConfig>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut fields = Vec::with_capacity(configs.len());

        for (index, config) in configs.into_iter().enumerate() {
            if config.field_name.trim().is_empty() {
                return Err(DetectorError::EmptyFieldName { index });
            }
            if !seen.insert(config.field_name.clone()) {
                return Err(DetectorError::DuplicateField(config.field_name));
            }

            let mut patterns = Vec::with_capacity(config.patterns.len());
            for pattern in &config.patterns {
                if !(0.0..=1.0).contains(&pattern.weight) {
                    return Err(DetectorError::InvalidWeight {
                        field: config.field_name.clone(),
                        pattern: pattern.pattern.clone(),
                        weight: pattern.weight,
                    });
                }
                let source = if pattern.exact {
                    format!("^(?:{})", pattern.pattern)
                } else {
                    pattern.pattern.clone()
                };
                let regex = Regex::new(&source).map_err(|source| DetectorError::InvalidPattern {
                    field: config.field_name.clone(),
                    pattern: pattern.pattern.clone(),
                    source,
                })?;
                patterns.push(CompiledPattern {
                    regex,
                    weight: pattern.weight,
                });
            }
            fields.push(CompiledField { config, patterns });
        }

        // Stable sort keeps declaration order among equal priorities.
        fields.sort_by_key(|f| f.config.priority);
        Ok(Self { fields })
    }

    /// Field configs in processing order.
    pub fn fields(&self) -> impl Iterator<Item = &ColumnFieldConfig> {
        self.fields.iter().map(|f| &f.config)
    }

    /// Match score of one header for one field, or `None` for an unknown field.
    pub fn score(&self, column: &str, field_name: &str) -> Option<f64> {
        let field = self
            .fields
            .iter()
            .find(|f| f.config.field_name == field_name)?;
        Some(field.score(&normalize_header(column)))
    }

    /// Assign columns to fields.
    ///
    /// A column is only eligible when its score strictly exceeds
    /// `min_confidence`. Ties go to the earliest column.
    pub fn detect(&self, columns: &[String], min_confidence: f64) -> DetectionResult {
        self.detect_with_overrides(columns, &BTreeMap::new(), min_confidence)
    }

    /// Assign columns to fields, honouring caller overrides first.
    ///
    /// Overrides map a field name to a header. They claim their column with
    /// full confidence before any scoring; overrides for unknown fields or
    /// headers not present are skipped with a note.
    pub fn detect_with_overrides(
        &self,
        columns: &[String],
        overrides: &BTreeMap<String, String>,
        min_confidence: f64,
    ) -> DetectionResult {
        let normalized: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();
        let mut claimed = vec![false; columns.len()];
        let mut assignments = BTreeMap::new();
        let mut notes = Vec::new();

        for (field_name, wanted) in overrides {
            if !self.fields.iter().any(|f| &f.config.field_name == field_name) {
                warn!(field = %field_name, "column mapping names an unknown field");
                notes.push(format!(
                    "Column mapping for unknown field '{field_name}' was ignored"
                ));
                continue;
            }
            let Some(column) = find_column(columns, wanted) else {
                warn!(field = %field_name, "column mapping names a missing column");
                notes.push(format!(
                    "Column mapping {field_name} -> '{wanted}' was ignored: column not found"
                ));
                continue;
            };
            let Some(index) = columns
                .iter()
                .enumerate()
                .position(|(i, c)| c == column && !claimed[i])
            else {
                notes.push(format!(
                    "Column mapping {field_name} -> '{column}' was ignored: column already mapped"
                ));
                continue;
            };
            claimed[index] = true;
            notes.push(format!("Column mapping applied: {field_name} -> '{column}'"));
            assignments.insert(
                field_name.clone(),
                ColumnAssignment {
                    column: column.to_string(),
                    confidence: OVERRIDE_CONFIDENCE,
                    source: AssignmentSource::Override,
                },
            );
        }

        let mut missing_required = Vec::new();
        for field in &self.fields {
            let name = &field.config.field_name;
            if assignments.contains_key(name) {
                continue;
            }

            let mut best: Option<(usize, f64)> = None;
            for (index, header) in normalized.iter().enumerate() {
                if claimed[index] {
                    continue;
                }
                let score = field.score(header);
                if score <= min_confidence {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((_, current)) => score.partial_cmp(&current) == Some(Ordering::Greater),
                };
                if better {
                    best = Some((index, score));
                }
            }

            match best {
                Some((index, confidence)) => {
                    claimed[index] = true;
                    debug!(field = %name, column = %columns[index], confidence, "column detected");
                    assignments.insert(
                        name.clone(),
                        ColumnAssignment {
                            column: columns[index].clone(),
                            confidence,
                            source: AssignmentSource::Detected,
                        },
                    );
                }
                None if field.config.required => {
                    debug!(field = %name, "required field not detected");
                    missing_required.push(name.clone());
                    let note = if field.config.missing_note.is_empty() {
                        format!("Required column for '{name}' was not detected")
                    } else {
                        field.config.missing_note.clone()
                    };
                    notes.push(note);
                }
                None => {}
            }
        }

        DetectionResult {
            assignments,
            all_columns: columns.to_vec(),
            detection_notes: notes,
            missing_required,
        }
    }
}

/// One-shot detection over an uncompiled profile.
pub fn detect_columns(
    columns: &[String],
    configs: Vec<ColumnFieldConfig>,
    min_confidence: f64,
) -> Result<DetectionResult> {
    Ok(ColumnDetector::new(configs)?.detect(columns, min_confidence))
}
