//! Completeness scoring against a configured field profile.
//!
//! Every domain engine shares this assessor. Fields with an explicit weight
//! are the "required" part of the score; fields without one share the
//! optional weight pool evenly. When a profile has no optional fields at all
//! the whole pool is credited as a flat bonus, so a fully populated file
//! always scores 100 regardless of how its fields are split.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use audit_model::ensure_in_range;
use audit_model::rounding::{serialize_fraction_map, serialize_score};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QualityError, Result};

/// Default share of the score reserved for optional fields.
pub const DEFAULT_OPTIONAL_WEIGHT_POOL: f64 = 0.15;

/// Placeholders substituted in issue templates.
const PLACEHOLDERS: &[&str] = &["field", "filled", "unfilled", "total", "fill_pct"];

type Accessor<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// How one field contributes to the completeness score.
pub struct FieldQualityConfig<E> {
    pub field_name: String,
    accessor: Accessor<E>,
    /// Explicit weight; `None` marks the field optional.
    pub weight: Option<f64>,
    /// Fill rate below which an issue is reported.
    pub issue_threshold: Option<f64>,
    /// Issue text with `{field}`, `{filled}`, `{unfilled}`, `{total}` and
    /// `{fill_pct}` placeholders.
    pub issue_template: Option<String>,
}

impl<E> FieldQualityConfig<E> {
    /// Optional field with no issue reporting.
    pub fn new(
        field_name: impl Into<String>,
        accessor: impl Fn(&E) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            accessor: Box::new(accessor),
            weight: None,
            issue_threshold: None,
            issue_template: None,
        }
    }

    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Report `template` when the fill rate drops below `threshold`.
    #[must_use]
    pub fn with_issue(mut self, threshold: f64, template: impl Into<String>) -> Self {
        self.issue_threshold = Some(threshold);
        self.issue_template = Some(template.into());
        self
    }

    pub fn is_optional(&self) -> bool {
        self.weight.is_none()
    }

    pub fn is_filled(&self, entry: &E) -> bool {
        (self.accessor)(entry)
    }
}

impl<E> fmt::Debug for FieldQualityConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldQualityConfig")
            .field("field_name", &self.field_name)
            .field("weight", &self.weight)
            .field("issue_threshold", &self.issue_threshold)
            .field("issue_template", &self.issue_template)
            .finish_non_exhaustive()
    }
}

/// Outcome of a completeness assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityResult {
    #[serde(serialize_with = "serialize_score")]
    pub completeness_score: f64,
    #[serde(serialize_with = "serialize_fraction_map")]
    pub field_fill_rates: BTreeMap<String, f64>,
    pub detected_issues: Vec<String>,
    pub total_rows: usize,
}

/// A validated set of field configs plus the optional weight pool.
#[derive(Debug)]
pub struct QualityProfile<E> {
    fields: Vec<FieldQualityConfig<E>>,
    optional_weight_pool: f64,
}

impl<E> QualityProfile<E> {
    /// Validate a profile using the default optional pool.
    pub fn new(fields: Vec<FieldQualityConfig<E>>) -> Result<Self> {
        Self::with_pool(fields, DEFAULT_OPTIONAL_WEIGHT_POOL)
    }

    /// Validate a profile.
    ///
    /// Rejects duplicate names, weights, thresholds or pool outside `[0, 1]`
    /// and templates that use unknown placeholders.
    pub fn with_pool(
        fields: Vec<FieldQualityConfig<E>>,
        optional_weight_pool: f64,
    ) -> Result<Self> {
        ensure_in_range("optional_weight_pool", optional_weight_pool, 0.0, 1.0).map_err(
            |source| QualityError::OutOfRange {
                field: "*".to_string(),
                source,
            },
        )?;

        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(field.field_name.as_str()) {
                return Err(QualityError::DuplicateField(field.field_name.clone()));
            }
            let out_of_range = |source| QualityError::OutOfRange {
                field: field.field_name.clone(),
                source,
            };
            if let Some(weight) = field.weight {
                ensure_in_range("weight", weight, 0.0, 1.0).map_err(out_of_range)?;
            }
            if let Some(threshold) = field.issue_threshold {
                ensure_in_range("issue_threshold", threshold, 0.0, 1.0).map_err(out_of_range)?;
            }
            if let Some(template) = &field.issue_template {
                check_placeholders(&field.field_name, template)?;
            }
        }

        Ok(Self {
            fields,
            optional_weight_pool,
        })
    }

    pub fn fields(&self) -> &[FieldQualityConfig<E>] {
        &self.fields
    }

    pub fn optional_weight_pool(&self) -> f64 {
        self.optional_weight_pool
    }

    /// Effective weight of every field plus the flat bonus.
    ///
    /// The bonus is the whole optional pool when no field is optional and
    /// zero otherwise.
    pub fn effective_weights(&self) -> (BTreeMap<&str, f64>, f64) {
        self.weights_for_pool(self.optional_weight_pool)
    }

    fn weights_for_pool(&self, pool: f64) -> (BTreeMap<&str, f64>, f64) {
        let optional_count = self.fields.iter().filter(|f| f.is_optional()).count();
        let per_optional = if optional_count == 0 {
            0.0
        } else {
            pool / optional_count as f64
        };
        let weights = self
            .fields
            .iter()
            .map(|f| (f.field_name.as_str(), f.weight.unwrap_or(per_optional)))
            .collect();
        let bonus = if optional_count == 0 {
            pool
        } else {
            0.0
        };
        (weights, bonus)
    }

    /// Score how completely `entries` populate the profile's fields.
    pub fn assess(&self, entries: &[E]) -> DataQualityResult {
        self.assess_with_pool(entries, self.optional_weight_pool)
    }

    /// Score with a different optional pool than the profile was built with.
    ///
    /// The pool is clamped to `[0, 1]`.
    pub fn assess_with_pool(&self, entries: &[E], optional_weight_pool: f64) -> DataQualityResult {
        let total = entries.len();
        if total == 0 {
            return DataQualityResult::default();
        }

        let pool = if optional_weight_pool.is_nan() {
            self.optional_weight_pool
        } else {
            optional_weight_pool.clamp(0.0, 1.0)
        };
        let (weights, bonus) = self.weights_for_pool(pool);
        let mut fill_rates = BTreeMap::new();
        let mut issues = Vec::new();
        let mut weighted = bonus;

        for field in &self.fields {
            let filled = entries.iter().filter(|e| field.is_filled(e)).count();
            let fill_rate = filled as f64 / total as f64;
            debug!(field = %field.field_name, filled, total, "field fill rate");

            if let (Some(threshold), Some(template)) =
                (field.issue_threshold, &field.issue_template)
                && fill_rate < threshold
            {
                issues.push(render_issue(template, &field.field_name, filled, total));
            }

            weighted += fill_rate * weights.get(field.field_name.as_str()).copied().unwrap_or(0.0);
            fill_rates.insert(field.field_name.clone(), fill_rate);
        }

        DataQualityResult {
            completeness_score: (weighted * 100.0).min(100.0),
            field_fill_rates: fill_rates,
            detected_issues: issues,
            total_rows: total,
        }
    }
}

/// One-shot assessment over unvalidated configs.
pub fn assess<E>(
    entries: &[E],
    fields: Vec<FieldQualityConfig<E>>,
    optional_weight_pool: f64,
) -> Result<DataQualityResult> {
    Ok(QualityProfile::with_pool(fields, optional_weight_pool)?.assess(entries))
}

fn render_issue(template: &str, field: &str, filled: usize, total: usize) -> String {
    let unfilled = total - filled;
    let fill_pct = filled as f64 / total as f64 * 100.0;
    template
        .replace("{field}", field)
        .replace("{filled}", &filled.to_string())
        .replace("{unfilled}", &unfilled.to_string())
        .replace("{total}", &total.to_string())
        .replace("{fill_pct}", &format!("{fill_pct:.1}"))
}

fn check_placeholders(field: &str, template: &str) -> Result<()> {
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        if !PLACEHOLDERS.contains(&name) {
            return Err(QualityError::UnknownPlaceholder {
                field: field.to_string(),
                placeholder: name.to_string(),
            });
        }
        rest = &after[end + 1..];
    }
    Ok(())
}
