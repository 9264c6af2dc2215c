//! End-to-end tests for the analysis engine.

use std::collections::BTreeMap;

use audit_core::ledger::{self, LedgerEntry};
use audit_core::{
    AnalysisOptions, AuditEngine, EngineError, FnTest, SamplingOptions, SamplingPopulation,
};
use audit_map::ColumnDetector;
use audit_map::profiles::journal_entry;
use audit_model::{AnalysisInput, FlaggedEntry, RiskTier, Row, Severity, TestResult, TestTier};
use audit_sample::SeedOrigin;
use audit_score::ScoringOptions;

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Ten journal lines; the first four have no posting date.
fn ledger_input() -> AnalysisInput {
    let rows = (0..10)
        .map(|i| {
            let date = if i < 4 {
                String::new()
            } else {
                format!("2024-{:02}-15", i)
            };
            Row::new()
                .with("Entry No", format!("JE-{}", 100 + i))
                .with("Posting Date", date)
                .with("Account", if i % 2 == 0 { "1000" } else { "2000" })
                .with("Amount", format!("{:.2}", 125.0 * f64::from(i + 1)))
                .with("Description", "monthly accrual")
        })
        .collect();
    AnalysisInput::new(
        columns(&["Entry No", "Posting Date", "Account", "Amount", "Description"]),
        rows,
    )
}

#[test]
fn ledger_analysis_end_to_end() {
    let engine = ledger::engine().unwrap();
    let report = engine.run(&ledger_input(), &AnalysisOptions::default()).unwrap();

    assert_eq!(report.engine, ledger::ENGINE_NAME);
    assert_eq!(
        report.column_detection.column_for("posting_date"),
        Some("Posting Date")
    );
    assert_eq!(report.column_detection.column_for("entry_id"), Some("Entry No"));
    assert_eq!(
        report.data_quality.detected_issues,
        vec!["4 of 10 entries have no readable posting date (60.0% filled)".to_string()]
    );

    let missing = report.test_result(ledger::MISSING_CORE_FIELDS).unwrap();
    assert_eq!(missing.entries_flagged, 4);
    assert_eq!(missing.flagged_entries[0].entry_id.as_deref(), Some("JE-100"));

    let benford = report.test_result(ledger::BENFORD_FIRST_DIGIT).unwrap();
    assert_eq!(benford.entries_flagged, 0);
    assert!(benford.description.contains("at least 500"));

    assert_eq!(report.composite_score.tests_run, 4);
    assert_eq!(report.composite_score.total_entries, 10);
    assert!(report.skipped_tests.is_empty());
    assert!(report.sampling_result.is_none());

    let json = serde_json::to_value(&report).unwrap();
    for key in ["column_detection", "data_quality", "test_results", "composite_score"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(json.get("sampling_result").is_none());
}

#[test]
fn three_of_four_tests_escalate_score() {
    let flag_first = |key: &'static str| {
        FnTest::new(key, key, TestTier::Structural, move |entries: &[LedgerEntry], _| {
            TestResult::new(
                key,
                key,
                TestTier::Structural,
                Severity::Low,
                entries.len(),
                vec![FlaggedEntry::new(entries[0].row_index, Severity::Low, "first row")],
            )
        })
    };
    let quiet = FnTest::new(
        "quiet",
        "Quiet",
        TestTier::Structural,
        |entries: &[LedgerEntry], _| {
            TestResult::new(
                "quiet",
                "Quiet",
                TestTier::Structural,
                Severity::Low,
                entries.len(),
                Vec::new(),
            )
        },
    );

    let engine = AuditEngine::new(
        "custom",
        ColumnDetector::new(journal_entry()).unwrap(),
        ledger::quality_profile().unwrap(),
        LedgerEntry::from_row,
    )
    .with_test(flag_first("a"))
    .unwrap()
    .with_test(flag_first("b"))
    .unwrap()
    .with_test(flag_first("c"))
    .unwrap()
    .with_test(quiet)
    .unwrap();

    let report = engine.run(&ledger_input(), &AnalysisOptions::default()).unwrap();
    let composite = &report.composite_score;
    assert_eq!(composite.multi_flag_rows, 1);
    assert!((composite.multiplier - 1.025).abs() < 1e-12);
    assert_eq!(composite.total_flagged, 1);
    assert_eq!(composite.risk_tier, RiskTier::Low);
}

#[test]
fn duplicate_test_keys_are_rejected() {
    let engine = ledger::engine().unwrap();
    let result = engine.with_test(FnTest::new(
        ledger::AMOUNT_OUTLIERS,
        "Again",
        TestTier::Contract,
        |entries: &[LedgerEntry], _| {
            TestResult::new("x", "x", TestTier::Contract, Severity::Low, entries.len(), Vec::new())
        },
    ));
    assert!(matches!(result, Err(EngineError::DuplicateTest(_))));
}

#[test]
fn missing_account_skips_concentration() {
    let input = AnalysisInput::new(
        columns(&["Date", "Amount"]),
        vec![Row::new().with("Date", "2024-01-02").with("Amount", 10.0)],
    );
    let report = ledger::engine()
        .unwrap()
        .run(&input, &AnalysisOptions::default())
        .unwrap();

    assert!(report.test_result(ledger::ACCOUNT_CONCENTRATION).is_none());
    assert_eq!(report.composite_score.tests_run, 3);
    assert!(
        report
            .column_detection
            .detection_notes
            .iter()
            .any(|n| n.starts_with("No account column detected"))
    );
    insta::assert_json_snapshot!(report.skipped_tests, @r#"
    [
      {
        "test_key": "account_concentration",
        "test_name": "Account Concentration",
        "missing_fields": [
          "account"
        ]
      }
    ]
    "#);
}

#[test]
fn no_amount_columns_adds_note() {
    let input = AnalysisInput::new(
        columns(&["Posting Date", "Account"]),
        vec![Row::new().with("Posting Date", "2024-01-02").with("Account", "1000")],
    );
    let report = ledger::engine()
        .unwrap()
        .run(&input, &AnalysisOptions::default())
        .unwrap();
    assert!(
        report
            .column_detection
            .detection_notes
            .iter()
            .any(|n| n.starts_with("No amount, debit or credit column"))
    );
}

#[test]
fn column_mapping_overrides_detection() {
    let mut mapping = BTreeMap::new();
    mapping.insert("amount".to_string(), "Value USD".to_string());
    let input = AnalysisInput::new(
        columns(&["Posting Date", "Account", "Value USD"]),
        vec![
            Row::new()
                .with("Posting Date", "2024-02-01")
                .with("Account", "4000")
                .with("Value USD", "$1,500.00"),
        ],
    )
    .with_column_mapping(mapping);

    let engine = ledger::engine().unwrap();
    let report = engine.run(&input, &AnalysisOptions::default()).unwrap();
    assert_eq!(report.column_detection.column_for("amount"), Some("Value USD"));
    assert_eq!(report.column_detection.confidence_for("amount"), Some(1.0));

    let detection = engine.detect(&input, 0.0);
    let entries = engine.build_entries(&input, &detection);
    assert_eq!(entries[0].amount, Some(1500.0));
}

#[test]
fn flagged_population_sampling_is_reproducible() {
    let engine = ledger::engine().unwrap();
    let sampling = SamplingOptions::rate(vec!["amount_band".into(), "account".into()], 0.5)
        .with_seed(Some(2024))
        .with_population(SamplingPopulation::Flagged);
    let options = AnalysisOptions::default().with_sampling(Some(sampling));

    let first = engine.run(&ledger_input(), &options).unwrap();
    let second = engine.run(&ledger_input(), &options).unwrap();
    let sample = first.sampling_result.as_ref().unwrap();
    assert_eq!(first.sampling_result, second.sampling_result);
    assert_eq!(sample.seed, 2024);
    assert_eq!(sample.seed_origin, SeedOrigin::Provided);

    let flagged: Vec<usize> = first
        .test_results
        .iter()
        .flat_map(|r| r.flagged_rows())
        .collect();
    assert_eq!(
        sample.total_population,
        flagged.iter().collect::<std::collections::BTreeSet<_>>().len()
    );
    assert!(sample.sampled_row_ids.iter().all(|id| flagged.contains(id)));
}

#[test]
fn invalid_options_fail_before_analysis() {
    let engine = ledger::engine().unwrap();
    let unknown = AnalysisOptions::default()
        .with_sampling(Some(SamplingOptions::rate(vec!["weekday".into()], 0.2)));
    assert!(matches!(
        engine.run(&ledger_input(), &unknown),
        Err(EngineError::Sampling(_))
    ));

    let bad_threshold = AnalysisOptions::default()
        .with_scoring(ScoringOptions::default().with_multi_flag_threshold(0));
    assert!(matches!(
        engine.run(&ledger_input(), &bad_threshold),
        Err(EngineError::InvalidOptions(_))
    ));
}

#[test]
fn empty_input_is_well_defined() {
    let input = AnalysisInput::new(columns(&["Date", "Account", "Amount"]), Vec::new());
    let report = ledger::engine()
        .unwrap()
        .run(&input, &AnalysisOptions::default())
        .unwrap();
    assert_eq!(report.data_quality.completeness_score, 0.0);
    assert_eq!(report.composite_score.score, 0.0);
    assert_eq!(report.composite_score.risk_tier, RiskTier::Low);
    assert!(report.test_results.iter().all(|r| r.entries_flagged == 0));
}

mod properties {
    use super::*;
    use audit_model::CellValue;
    use proptest::prelude::*;

    fn cell() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            Just(CellValue::Null),
            any::<bool>().prop_map(CellValue::Bool),
            (-1e7f64..1e7).prop_map(CellValue::Number),
            "[ -~]{0,12}".prop_map(CellValue::Text),
        ]
    }

    proptest! {
        #[test]
        fn arbitrary_cells_never_fail(
            cells in prop::collection::vec((cell(), cell(), cell()), 0..40),
        ) {
            let rows = cells
                .into_iter()
                .map(|(date, account, amount)| {
                    Row::new()
                        .with("Posting Date", date)
                        .with("Account", account)
                        .with("Amount", amount)
                })
                .collect();
            let input = AnalysisInput::new(columns(&["Posting Date", "Account", "Amount"]), rows);
            let report = ledger::engine()
                .unwrap()
                .run(&input, &AnalysisOptions::default())
                .unwrap();
            prop_assert!((0.0..=100.0).contains(&report.composite_score.score));
            prop_assert!((0.0..=100.0).contains(&report.data_quality.completeness_score));
        }
    }
}
