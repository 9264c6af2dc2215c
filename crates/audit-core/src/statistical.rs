//! Generic tests built on the statistical analyzers.
//!
//! Each adapter reads the values it needs through accessors, so any domain
//! engine can reuse them over its own entry type.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use audit_model::{FlaggedEntry, Severity, TestResult, TestTier};
use audit_stats::{
    ConcentrationLevel, ConformityLevel, analyze_with, compute_hhi, first_digit, mean_and_std,
    z_score, zscore_to_severity,
};
use tracing::{debug, warn};

use crate::audit_test::{AuditEntry, AuditTest, TestConfig};

type AmountFn<E> = Arc<dyn Fn(&E) -> Option<f64> + Send + Sync>;
type KeyFn<E> = Arc<dyn Fn(&E) -> Option<String> + Send + Sync>;
type PresenceFn<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Name, key and prerequisites shared by every adapter.
#[derive(Debug, Clone)]
struct Meta {
    key: String,
    name: String,
    required_fields: Vec<String>,
}

impl Meta {
    fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            required_fields: Vec::new(),
        }
    }
}

fn flag<E: AuditEntry>(entry: &E, severity: Severity, reason: String) -> FlaggedEntry {
    FlaggedEntry::new(entry.row_index(), severity, reason)
        .with_entry_id(entry.entry_id().map(str::to_string))
}

macro_rules! impl_meta {
    ($ty:ident) => {
        impl<E> $ty<E> {
            /// Skip the test unless `field` was assigned a column.
            #[must_use]
            pub fn requires(mut self, field: impl Into<String>) -> Self {
                self.meta.required_fields.push(field.into());
                self
            }
        }

        impl<E> fmt::Debug for $ty<E> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("meta", &self.meta)
                    .finish_non_exhaustive()
            }
        }
    };
}

/// First-digit test over an amount accessor.
pub struct BenfordTest<E> {
    meta: Meta,
    amount: AmountFn<E>,
}

impl_meta!(BenfordTest);

pub fn benford_test<E>(
    key: &str,
    name: &str,
    amount: impl Fn(&E) -> Option<f64> + Send + Sync + 'static,
) -> BenfordTest<E> {
    BenfordTest {
        meta: Meta::new(key, name),
        amount: Arc::new(amount),
    }
}

impl<E: AuditEntry> AuditTest<E> for BenfordTest<E> {
    fn key(&self) -> &str {
        &self.meta.key
    }

    fn name(&self) -> &str {
        &self.meta.name
    }

    fn tier(&self) -> TestTier {
        TestTier::Statistical
    }

    fn required_fields(&self) -> &[String] {
        &self.meta.required_fields
    }

    fn run(&self, entries: &[E], config: &TestConfig) -> TestResult {
        let amounts: Vec<Option<f64>> = entries.iter().map(|e| (self.amount)(e)).collect();
        let present: Vec<f64> = amounts.iter().flatten().copied().collect();
        let analysis = analyze_with(&present, entries.len(), config.benford);

        let build = |flags, description: String| {
            TestResult::new(
                &self.meta.key,
                &self.meta.name,
                TestTier::Statistical,
                Severity::Medium,
                entries.len(),
                flags,
            )
            .with_description(description)
        };

        let Some(conformity) = analysis.conformity_level else {
            let message = analysis.precheck_message.unwrap_or_default();
            warn!(test = %self.meta.key, %message, "benford prechecks failed");
            return build(Vec::new(), message);
        };
        let description = format!(
            "First-digit distribution is {} (MAD {:.4}, chi-squared {:.2})",
            conformity.as_str(),
            analysis.mad,
            analysis.chi_squared
        );
        if !conformity.is_suspicious() {
            return build(Vec::new(), description);
        }

        let digits = analysis.over_represented_digits();
        let severity = if conformity == ConformityLevel::Nonconforming {
            Severity::Medium
        } else {
            Severity::Low
        };
        let flags = entries
            .iter()
            .zip(&amounts)
            .filter_map(|(entry, amount)| {
                let amount = (*amount)?;
                let digit = first_digit(amount)?;
                digits.contains(&digit).then(|| {
                    let share = analysis
                        .actual_distribution
                        .get(&digit)
                        .copied()
                        .unwrap_or(0.0);
                    let expected = analysis
                        .expected_distribution
                        .get(&digit)
                        .copied()
                        .unwrap_or(0.0);
                    flag(
                        entry,
                        severity,
                        format!(
                            "Leading digit {digit} appears in {:.1}% of amounts; {:.1}% expected",
                            share * 100.0,
                            expected * 100.0
                        ),
                    )
                    .with_amount(amount)
                })
            })
            .collect();
        build(flags, description)
    }
}

/// Flags amounts whose z-score exceeds the configured threshold.
pub struct ZScoreOutlierTest<E> {
    meta: Meta,
    amount: AmountFn<E>,
}

impl_meta!(ZScoreOutlierTest);

pub fn zscore_outlier_test<E>(
    key: &str,
    name: &str,
    amount: impl Fn(&E) -> Option<f64> + Send + Sync + 'static,
) -> ZScoreOutlierTest<E> {
    ZScoreOutlierTest {
        meta: Meta::new(key, name),
        amount: Arc::new(amount),
    }
}

impl<E: AuditEntry> AuditTest<E> for ZScoreOutlierTest<E> {
    fn key(&self) -> &str {
        &self.meta.key
    }

    fn name(&self) -> &str {
        &self.meta.name
    }

    fn tier(&self) -> TestTier {
        TestTier::Statistical
    }

    fn required_fields(&self) -> &[String] {
        &self.meta.required_fields
    }

    fn run(&self, entries: &[E], config: &TestConfig) -> TestResult {
        let amounts: Vec<Option<f64>> = entries.iter().map(|e| (self.amount)(e)).collect();
        let present: Vec<f64> = amounts.iter().flatten().copied().collect();
        let (mean, std_dev) = mean_and_std(&present);
        debug!(test = %self.meta.key, mean, std_dev, n = present.len(), "outlier baseline");

        let threshold = config.outlier_z_threshold;
        let flags = entries
            .iter()
            .zip(&amounts)
            .filter_map(|(entry, amount)| {
                let amount = (*amount)?;
                let z = z_score(amount, mean, std_dev);
                (z.abs() > threshold).then(|| {
                    flag(
                        entry,
                        zscore_to_severity(z.abs()),
                        format!("Amount is {z:+.1} standard deviations from the mean"),
                    )
                    .with_amount(amount)
                })
            })
            .collect();

        TestResult::new(
            &self.meta.key,
            &self.meta.name,
            TestTier::Statistical,
            Severity::High,
            entries.len(),
            flags,
        )
        .with_description(format!(
            "Amounts more than {threshold:.1} standard deviations from the mean"
        ))
    }
}

/// Flags the dominant key when totals per key are concentrated.
pub struct ConcentrationTest<E> {
    meta: Meta,
    group: KeyFn<E>,
    amount: AmountFn<E>,
    label: String,
}

impl_meta!(ConcentrationTest);

/// `label` names the grouped entity in reasons ("account", "vendor").
pub fn concentration_test<E>(
    key: &str,
    name: &str,
    label: &str,
    group: impl Fn(&E) -> Option<String> + Send + Sync + 'static,
    amount: impl Fn(&E) -> Option<f64> + Send + Sync + 'static,
) -> ConcentrationTest<E> {
    ConcentrationTest {
        meta: Meta::new(key, name),
        group: Arc::new(group),
        amount: Arc::new(amount),
        label: label.to_string(),
    }
}

impl<E: AuditEntry> AuditTest<E> for ConcentrationTest<E> {
    fn key(&self) -> &str {
        &self.meta.key
    }

    fn name(&self) -> &str {
        &self.meta.name
    }

    fn tier(&self) -> TestTier {
        TestTier::Statistical
    }

    fn required_fields(&self) -> &[String] {
        &self.meta.required_fields
    }

    fn run(&self, entries: &[E], _config: &TestConfig) -> TestResult {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for entry in entries {
            if let (Some(group), Some(amount)) = ((self.group)(entry), (self.amount)(entry))
                && amount.is_finite()
            {
                *totals.entry(group).or_default() += amount.abs();
            }
        }

        let shares: Vec<f64> = totals.values().copied().collect();
        let hhi = compute_hhi(&shares);
        let description = format!(
            "Amounts by {} are {} (HHI {:.0} across {} {}s)",
            self.label,
            hhi.concentration_level.as_str(),
            hhi.hhi,
            hhi.entity_count,
            self.label
        );

        let mut flags = Vec::new();
        if hhi.concentration_level == ConcentrationLevel::Concentrated {
            // First key wins ties.
            let top = totals
                .iter()
                .fold(None::<(&String, f64)>, |best, (key, total)| match best {
                    Some((_, best_total)) if best_total >= *total => best,
                    _ => Some((key, *total)),
                });
            if let Some((top_key, _)) = top {
                debug!(test = %self.meta.key, hhi = hhi.hhi, "concentrated population");
                flags = entries
                    .iter()
                    .filter(|e| (self.group)(*e).as_deref() == Some(top_key.as_str()))
                    .map(|e| {
                        let entry_flag = flag(
                            e,
                            Severity::Medium,
                            format!(
                                "{} '{}' holds {:.1}% of the total amount",
                                self.label, top_key, hhi.top_share_pct
                            ),
                        );
                        match (self.amount)(e) {
                            Some(amount) => entry_flag.with_amount(amount),
                            None => entry_flag,
                        }
                    })
                    .collect();
            }
        }

        TestResult::new(
            &self.meta.key,
            &self.meta.name,
            TestTier::Statistical,
            Severity::Medium,
            entries.len(),
            flags,
        )
        .with_description(description)
    }
}

/// Flags entries missing any of a set of values.
pub struct CompletenessTest<E> {
    meta: Meta,
    fields: Vec<(String, PresenceFn<E>)>,
}

impl_meta!(CompletenessTest);

pub fn completeness_test<E>(key: &str, name: &str) -> CompletenessTest<E> {
    CompletenessTest {
        meta: Meta::new(key, name),
        fields: Vec::new(),
    }
}

impl<E> CompletenessTest<E> {
    /// Require `field` to be present on every entry.
    #[must_use]
    pub fn field(
        mut self,
        field: impl Into<String>,
        present: impl Fn(&E) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fields.push((field.into(), Arc::new(present)));
        self
    }
}

impl<E: AuditEntry> AuditTest<E> for CompletenessTest<E> {
    fn key(&self) -> &str {
        &self.meta.key
    }

    fn name(&self) -> &str {
        &self.meta.name
    }

    fn tier(&self) -> TestTier {
        TestTier::Structural
    }

    fn required_fields(&self) -> &[String] {
        &self.meta.required_fields
    }

    fn run(&self, entries: &[E], _config: &TestConfig) -> TestResult {
        let flags = entries
            .iter()
            .filter_map(|entry| {
                let missing: Vec<&str> = self
                    .fields
                    .iter()
                    .filter(|(_, present)| !present(entry))
                    .map(|(name, _)| name.as_str())
                    .collect();
                (!missing.is_empty())
                    .then(|| flag(entry, Severity::Low, format!("Missing {}", missing.join(", "))))
            })
            .collect();

        let names: Vec<&str> = self.fields.iter().map(|(name, _)| name.as_str()).collect();
        TestResult::new(
            &self.meta.key,
            &self.meta.name,
            TestTier::Structural,
            Severity::Low,
            entries.len(),
            flags,
        )
        .with_description(format!("Entries missing any of: {}", names.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_sample::SampleRow;
    use audit_stats::BenfordOptions;

    #[derive(Debug)]
    struct Line {
        row: usize,
        account: Option<&'static str>,
        amount: Option<f64>,
    }

    impl SampleRow for Line {
        fn row_index(&self) -> usize {
            self.row
        }
    }

    impl AuditEntry for Line {}

    fn line(row: usize, account: Option<&'static str>, amount: Option<f64>) -> Line {
        Line {
            row,
            account,
            amount,
        }
    }

    #[test]
    fn test_outliers_flag_extremes() {
        let mut lines: Vec<Line> = (0..50).map(|i| line(i, Some("1000"), Some(100.0))).collect();
        lines.push(line(50, Some("1000"), Some(10_000.0)));
        let test = zscore_outlier_test("amount_outliers", "Amount Outliers", |l: &Line| l.amount);
        let result = test.run(&lines, &TestConfig::default());

        assert_eq!(result.entries_flagged, 1);
        let flagged = &result.flagged_entries[0];
        assert_eq!(flagged.row_index, 50);
        // z = 50 / sqrt(50) for one outlier among 50 equal values.
        assert_eq!(flagged.severity, Severity::High);
        assert_eq!(flagged.amount, Some(10_000.0));
    }

    #[test]
    fn test_negative_outliers_use_magnitude() {
        let mut lines: Vec<Line> = (0..50).map(|i| line(i, Some("1000"), Some(100.0))).collect();
        lines.push(line(50, Some("1000"), Some(-10_000.0)));
        let test = zscore_outlier_test("amount_outliers", "Amount Outliers", |l: &Line| l.amount);
        let result = test.run(&lines, &TestConfig::default());

        assert_eq!(result.entries_flagged, 1);
        let flagged = &result.flagged_entries[0];
        assert_eq!(flagged.row_index, 50);
        // z is about -7.1.
        assert_eq!(flagged.severity, Severity::High);
        assert!(flagged.reason.starts_with("Amount is -7.1"));
    }

    #[test]
    fn test_outliers_on_constant_amounts() {
        let lines: Vec<Line> = (0..10).map(|i| line(i, None, Some(5.0))).collect();
        let test = zscore_outlier_test("amount_outliers", "Amount Outliers", |l: &Line| l.amount);
        assert_eq!(test.run(&lines, &TestConfig::default()).entries_flagged, 0);
    }

    #[test]
    fn test_concentration_flags_top_key() {
        let mut lines = vec![line(0, Some("9999"), Some(9_000.0))];
        lines.extend((1..5).map(|i| line(i, Some("1000"), Some(250.0))));
        lines.push(line(5, Some("9999"), Some(-1_000.0)));
        let test = concentration_test(
            "account_concentration",
            "Account Concentration",
            "account",
            |l: &Line| l.account.map(str::to_string),
            |l: &Line| l.amount,
        );
        let result = test.run(&lines, &TestConfig::default());

        assert_eq!(result.flagged_rows().into_iter().collect::<Vec<_>>(), vec![0, 5]);
        assert!(result.flagged_entries.iter().all(|f| f.severity == Severity::Medium));
        assert!(result.flagged_entries[0].reason.contains("'9999'"));
    }

    #[test]
    fn test_balanced_accounts_not_flagged() {
        let accounts = ["1000", "2000", "3000", "4000", "5000"];
        let lines: Vec<Line> = (0..20)
            .map(|i| line(i, Some(accounts[i % 5]), Some(100.0)))
            .collect();
        let test = concentration_test(
            "account_concentration",
            "Account Concentration",
            "account",
            |l: &Line| l.account.map(str::to_string),
            |l: &Line| l.amount,
        );
        let result = test.run(&lines, &TestConfig::default());
        assert_eq!(result.entries_flagged, 0);
        assert!(result.description.contains("moderate"));
    }

    #[test]
    fn test_completeness_reasons() {
        let lines = vec![
            line(0, Some("1000"), Some(1.0)),
            line(1, None, None),
            line(2, Some("1000"), None),
        ];
        let test = completeness_test("missing_values", "Missing Values")
            .field("account", |l: &Line| l.account.is_some())
            .field("amount", |l: &Line| l.amount.is_some());
        let result = test.run(&lines, &TestConfig::default());

        assert_eq!(result.entries_flagged, 2);
        assert_eq!(result.flagged_entries[0].reason, "Missing account, amount");
        assert_eq!(result.flagged_entries[1].reason, "Missing amount");
        assert_eq!(result.tier, TestTier::Structural);
    }

    #[test]
    fn test_benford_not_applicable_has_no_flags() {
        let lines: Vec<Line> = (0..20).map(|i| line(i, None, Some(900.0 + i as f64))).collect();
        let test = benford_test("benford", "Benford First Digit", |l: &Line| l.amount);
        let result = test.run(&lines, &TestConfig::default());
        assert_eq!(result.entries_flagged, 0);
        assert!(result.description.contains("at least 500"));
    }

    #[test]
    fn test_benford_flags_over_represented_digit() {
        let lines: Vec<Line> = (0..100)
            .map(|i| line(i, None, Some(9.5 * 10f64.powi((i % 4) as i32))))
            .collect();
        let config = TestConfig {
            benford: BenfordOptions {
                min_entries: 50,
                min_magnitude_range: 2.0,
            },
            ..TestConfig::default()
        };
        let test = benford_test("benford", "Benford First Digit", |l: &Line| l.amount);
        let result = test.run(&lines, &config);

        assert_eq!(result.entries_flagged, 100);
        assert!(result.flagged_entries.iter().all(|f| f.severity == Severity::Medium));
        assert!(result.description.contains("nonconforming"));
    }
}
