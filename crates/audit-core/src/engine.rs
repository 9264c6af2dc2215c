//! Analysis engine.
//!
//! An [`AuditEngine`] owns everything a domain needs to analyze one file:
//! the column detector, the row-to-entry builder, the quality profile, the
//! tests and the stratifiers available for sampling.
//!
//! # Run order
//!
//! 1. Column detection (caller overrides first)
//! 2. Entry building
//! 3. Data quality assessment
//! 4. Every test whose required fields were detected
//! 5. Composite scoring
//! 6. Sampling, when requested

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use audit_ingest::{is_missing, parse_amount, parse_date, parse_text};
use audit_map::{ColumnDetector, DetectionResult};
use audit_model::{AnalysisInput, CellValue, RiskTier, Row, TestResult};
use audit_sample::{SamplingPlan, SamplingResult, Stratifier};
use audit_score::{CompositeScoreResult, calculate_composite_score};
use audit_validate::{DataQualityResult, QualityProfile};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, info_span, warn};

use crate::audit_test::{AuditEntry, AuditTest, TestConfig};
use crate::error::{EngineError, Result};
use crate::options::{AnalysisOptions, SamplingOptions, SamplingPopulation};

/// One raw row seen through the detected column assignments.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    index: usize,
    row: &'a Row,
    detection: &'a DetectionResult,
}

impl<'a> RowView<'a> {
    pub fn new(index: usize, row: &'a Row, detection: &'a DetectionResult) -> Self {
        Self {
            index,
            row,
            detection,
        }
    }

    /// Zero-based position of the row in the input.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.detection.is_assigned(field)
    }

    /// Raw cell of the column assigned to `field`.
    pub fn cell(&self, field: &str) -> Option<&'a CellValue> {
        let column = self.detection.column_for(field)?;
        self.row.get(column)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        parse_text(self.cell(field))
    }

    /// Amount of a populated cell. Unreadable values count as 0.0; empty
    /// cells are `None`.
    pub fn amount(&self, field: &str) -> Option<f64> {
        let cell = self.cell(field);
        if is_missing(cell) {
            None
        } else {
            Some(parse_amount(cell))
        }
    }

    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        parse_date(self.cell(field))
    }
}

/// A test that did not run because its fields were not detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTest {
    pub test_key: String,
    pub test_name: String,
    pub missing_fields: Vec<String>,
}

/// Everything produced by one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub engine: String,
    pub column_detection: DetectionResult,
    pub data_quality: DataQualityResult,
    pub test_results: Vec<TestResult>,
    pub composite_score: CompositeScoreResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_tests: Vec<SkippedTest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_result: Option<SamplingResult>,
}

impl AnalysisReport {
    pub fn risk_tier(&self) -> RiskTier {
        self.composite_score.risk_tier
    }

    pub fn test_result(&self, key: &str) -> Option<&TestResult> {
        self.test_results.iter().find(|r| r.test_key == key)
    }
}

type EntryBuilder<E> = Box<dyn Fn(&RowView<'_>) -> E + Send + Sync>;
type NoteRule = Box<dyn Fn(&DetectionResult) -> Option<String> + Send + Sync>;

pub struct AuditEngine<E> {
    name: String,
    detector: ColumnDetector,
    build_entry: EntryBuilder<E>,
    quality: QualityProfile<E>,
    tests: Vec<Box<dyn AuditTest<E>>>,
    stratifiers: BTreeMap<String, Stratifier<E>>,
    note_rules: Vec<NoteRule>,
}

impl<E> fmt::Debug for AuditEngine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditEngine")
            .field("name", &self.name)
            .field("tests", &self.tests.iter().map(|t| t.key()).collect::<Vec<_>>())
            .field("stratifiers", &self.stratifiers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<E: AuditEntry> AuditEngine<E> {
    pub fn new(
        name: impl Into<String>,
        detector: ColumnDetector,
        quality: QualityProfile<E>,
        build_entry: impl Fn(&RowView<'_>) -> E + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            detector,
            build_entry: Box::new(build_entry),
            quality,
            tests: Vec::new(),
            stratifiers: BTreeMap::new(),
            note_rules: Vec::new(),
        }
    }

    /// Register a test. Keys must be unique.
    pub fn with_test(mut self, test: impl AuditTest<E> + 'static) -> Result<Self> {
        if self.tests.iter().any(|t| t.key() == test.key()) {
            return Err(EngineError::DuplicateTest(test.key().to_string()));
        }
        self.tests.push(Box::new(test));
        Ok(self)
    }

    /// Make a stratifier available to sampling under its name.
    #[must_use]
    pub fn with_stratifier(mut self, stratifier: Stratifier<E>) -> Self {
        self.stratifiers
            .insert(stratifier.name().to_string(), stratifier);
        self
    }

    /// Add a detection note whenever `rule` returns one.
    #[must_use]
    pub fn with_note_rule(
        mut self,
        rule: impl Fn(&DetectionResult) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.note_rules.push(Box::new(rule));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detector(&self) -> &ColumnDetector {
        &self.detector
    }

    pub fn tests(&self) -> impl Iterator<Item = &dyn AuditTest<E>> {
        self.tests.iter().map(|t| t.as_ref())
    }

    pub fn stratifier_names(&self) -> impl Iterator<Item = &str> {
        self.stratifiers.keys().map(String::as_str)
    }

    /// Detect columns and append the engine's own notes.
    pub fn detect(&self, input: &AnalysisInput, min_confidence: f64) -> DetectionResult {
        let mut detection = self.detector.detect_with_overrides(
            &input.column_names,
            &input.column_mapping,
            min_confidence,
        );
        let notes: Vec<String> = self
            .note_rules
            .iter()
            .filter_map(|rule| rule(&detection))
            .collect();
        detection.detection_notes.extend(notes);
        detection
    }

    pub fn build_entries(&self, input: &AnalysisInput, detection: &DetectionResult) -> Vec<E> {
        input
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| (self.build_entry)(&RowView::new(index, row, detection)))
            .collect()
    }

    /// Resolve stratifier names into a validated plan.
    pub fn sampling_plan(&self, sampling: &SamplingOptions) -> Result<SamplingPlan<E>> {
        let stratifiers = sampling
            .stratify_by
            .iter()
            .map(|name| {
                self.stratifiers
                    .get(name)
                    .cloned()
                    .ok_or_else(|| audit_sample::SamplingError::UnknownStratifier(name.clone()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(SamplingPlan::new(stratifiers, sampling.method()?)?.with_seed(sampling.seed))
    }

    /// Analyze one file.
    ///
    /// Fails only on invalid options; data problems are reported in the
    /// detection notes, quality issues and test descriptions.
    pub fn run(&self, input: &AnalysisInput, options: &AnalysisOptions) -> Result<AnalysisReport> {
        options.validate()?;
        let plan = options
            .sampling
            .as_ref()
            .map(|sampling| self.sampling_plan(sampling).map(|plan| (plan, sampling.population)))
            .transpose()?;

        let span = info_span!("analysis", engine = %self.name, rows = input.rows.len());
        let _enter = span.enter();

        let detection = self.detect(input, options.min_confidence);
        info!(
            assigned = detection.assignments.len(),
            columns = detection.all_columns.len(),
            "column detection complete"
        );
        for note in &detection.detection_notes {
            debug!(%note, "detection note");
        }

        let entries = self.build_entries(input, &detection);
        let data_quality = self
            .quality
            .assess_with_pool(&entries, options.optional_weight_pool);
        info!(
            score = data_quality.completeness_score,
            issues = data_quality.detected_issues.len(),
            "data quality assessed"
        );

        let config = TestConfig::new(options, &detection);
        let mut test_results = Vec::new();
        let mut skipped_tests = Vec::new();
        for test in &self.tests {
            let missing: Vec<String> = test
                .required_fields()
                .iter()
                .filter(|field| !config.has_field(field))
                .cloned()
                .collect();
            if !missing.is_empty() {
                warn!(test = test.key(), missing = ?missing, "test skipped");
                skipped_tests.push(SkippedTest {
                    test_key: test.key().to_string(),
                    test_name: test.name().to_string(),
                    missing_fields: missing,
                });
                continue;
            }

            let _test_span = debug_span!("test", key = test.key()).entered();
            let result = test.run(&entries, &config);
            debug!(flagged = result.entries_flagged, "test complete");
            test_results.push(result);
        }

        let composite_score =
            calculate_composite_score(&test_results, entries.len(), &options.scoring);

        let sampling_result = plan.map(|(plan, population)| match population {
            SamplingPopulation::All => plan.run(&entries),
            SamplingPopulation::Flagged => {
                let flagged: BTreeSet<usize> = test_results
                    .iter()
                    .flat_map(|r| r.flagged_entries.iter().map(|f| f.row_index))
                    .collect();
                plan.run(entries.iter().filter(|e| flagged.contains(&e.row_index())))
            }
        });

        Ok(AnalysisReport {
            engine: self.name.clone(),
            column_detection: detection,
            data_quality,
            test_results,
            composite_score,
            skipped_tests,
            sampling_result,
        })
    }
}
