//! The contract every anomaly test implements.
//!
//! A test is a pure function from typed entries to a [`TestResult`]. Tests
//! never see raw rows and never fail: a test that cannot run on the data it
//! was given reports zero flags and explains why in its description.

use std::collections::BTreeSet;
use std::fmt;

use audit_map::DetectionResult;
use audit_model::{TestResult, TestTier};
use audit_sample::SampleRow;
use audit_stats::BenfordOptions;

use crate::options::AnalysisOptions;

/// A typed entry that tests can flag.
pub trait AuditEntry: SampleRow {
    /// Source document number, when one was detected.
    fn entry_id(&self) -> Option<&str> {
        None
    }
}

impl<T: AuditEntry + ?Sized> AuditEntry for &T {
    fn entry_id(&self) -> Option<&str> {
        (**self).entry_id()
    }
}

/// Per-run settings handed to every test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestConfig {
    pub benford: BenfordOptions,
    pub outlier_z_threshold: f64,
    /// Fields that found a column in this file.
    pub assigned_fields: BTreeSet<String>,
}

impl TestConfig {
    pub fn new(options: &AnalysisOptions, detection: &DetectionResult) -> Self {
        Self {
            benford: options.benford,
            outlier_z_threshold: options.outlier_z_threshold,
            assigned_fields: detection.assignments.keys().cloned().collect(),
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.assigned_fields.contains(field)
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::new(&AnalysisOptions::default(), &DetectionResult::default())
    }
}

/// A single anomaly test.
pub trait AuditTest<E>: Send + Sync {
    /// Stable snake_case key.
    fn key(&self) -> &str;

    /// Display name used in findings.
    fn name(&self) -> &str;

    fn tier(&self) -> TestTier;

    /// Fields that must be assigned for the test to run.
    ///
    /// Default implementation requires nothing.
    fn required_fields(&self) -> &[String] {
        &[]
    }

    fn run(&self, entries: &[E], config: &TestConfig) -> TestResult;
}

type TestFn<E> = Box<dyn Fn(&[E], &TestConfig) -> TestResult + Send + Sync>;

/// Wraps a plain function as an [`AuditTest`].
pub struct FnTest<E> {
    key: String,
    name: String,
    tier: TestTier,
    required_fields: Vec<String>,
    func: TestFn<E>,
}

impl<E> FnTest<E> {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        tier: TestTier,
        func: impl Fn(&[E], &TestConfig) -> TestResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            tier,
            required_fields: Vec::new(),
            func: Box::new(func),
        }
    }

    #[must_use]
    pub fn requires(mut self, field: impl Into<String>) -> Self {
        self.required_fields.push(field.into());
        self
    }
}

impl<E> fmt::Debug for FnTest<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTest")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

impl<E> AuditTest<E> for FnTest<E> {
    fn key(&self) -> &str {
        &self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> TestTier {
        self.tier
    }

    fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    fn run(&self, entries: &[E], config: &TestConfig) -> TestResult {
        (self.func)(entries, config)
    }
}
