//! Integration tests for the composite scorer.

use audit_model::{FlaggedEntry, RiskTier, Severity, TestResult, TestTier};
use audit_score::{Normalization, ScoringOptions, calculate_composite_score, score};
use proptest::prelude::*;

fn low_test(key: &str, name: &str, total: usize, rows: &[usize]) -> TestResult {
    TestResult::new(
        key,
        name,
        TestTier::Structural,
        Severity::Low,
        total,
        rows.iter()
            .map(|r| FlaggedEntry::new(*r, Severity::Low, name))
            .collect(),
    )
}

#[test]
fn row_flagged_by_three_tests_escalates() {
    let results = vec![
        low_test("round_amounts", "Round Amounts", 10, &[0]),
        low_test("weekend_postings", "Weekend Postings", 10, &[0]),
        low_test("manual_entries", "Manual Entries", 10, &[0]),
        low_test("duplicate_entries", "Duplicate Entries", 10, &[]),
    ];
    let out = score(&results, 10, Normalization::MaxPossible, 3);

    assert_eq!(out.multi_flag_rows, 1);
    assert!((out.multiplier - 1.025).abs() < 1e-12);
    assert_eq!(out.total_flagged, 1);
    assert_eq!(out.tests_run, 4);

    insta::assert_json_snapshot!(out, @r#"
    {
      "score": 7.7,
      "risk_tier": "low",
      "tests_run": 4,
      "total_entries": 10,
      "total_flagged": 1,
      "flag_rate": 0.1,
      "flags_by_severity": {
        "high": 0,
        "medium": 0,
        "low": 3
      },
      "top_findings": [
        "Round Amounts: 1 entries flagged (10.0%)",
        "Weekend Postings: 1 entries flagged (10.0%)",
        "Manual Entries: 1 entries flagged (10.0%)"
      ],
      "multi_flag_rows": 1,
      "multiplier": 1.025
    }
    "#);
}

#[test]
fn below_threshold_has_no_boost() {
    let results = vec![
        low_test("a", "A", 10, &[0]),
        low_test("b", "B", 10, &[0]),
    ];
    let out = score(&results, 10, Normalization::MaxPossible, 3);
    assert_eq!(out.multi_flag_rows, 0);
    assert_eq!(out.multiplier, 1.0);
}

#[test]
fn duplicate_flags_in_one_test_count_once() {
    let results = vec![TestResult::new(
        "a",
        "A",
        TestTier::Statistical,
        Severity::Medium,
        4,
        vec![
            FlaggedEntry::new(2, Severity::Medium, "first"),
            FlaggedEntry::new(2, Severity::High, "second"),
        ],
    )];
    let out = score(&results, 4, Normalization::TotalEntries, 2);
    assert_eq!(out.multi_flag_rows, 0);
    assert_eq!(out.total_flagged, 1);
    assert_eq!(out.flags_by_severity[&Severity::High], 1);
    assert_eq!(out.flags_by_severity[&Severity::Medium], 1);
}

#[test]
fn empty_results_with_entries() {
    let out = calculate_composite_score(&[], 25, &ScoringOptions::default());
    assert_eq!(out.score, 0.0);
    assert_eq!(out.risk_tier, RiskTier::Low);
    assert!(out.top_findings.is_empty());
}

proptest! {
    #[test]
    fn score_is_bounded(
        flags in prop::collection::vec(prop::collection::vec(0usize..20, 0..20), 0..6),
        total in 1usize..20,
        threshold in 1usize..5,
        by_entries in any::<bool>(),
    ) {
        let results: Vec<TestResult> = flags
            .iter()
            .enumerate()
            .map(|(i, rows)| {
                let rows: Vec<usize> = rows.iter().map(|r| r % total).collect();
                low_test(&format!("t{i}"), &format!("T{i}"), total, &rows)
            })
            .collect();
        let normalization = if by_entries {
            Normalization::TotalEntries
        } else {
            Normalization::MaxPossible
        };
        let out = score(&results, total, normalization, threshold);
        prop_assert!((0.0..=100.0).contains(&out.score));
        prop_assert!(out.multiplier >= 1.0 && out.multiplier <= 1.25);
        prop_assert!(out.total_flagged <= total);
        prop_assert_eq!(out.risk_tier, RiskTier::from_score(out.score));
    }

    #[test]
    fn zero_entries_is_always_zero(n in 0usize..5) {
        let results: Vec<TestResult> = (0..n)
            .map(|i| low_test(&format!("t{i}"), "T", 0, &[]))
            .collect();
        let out = score(&results, 0, Normalization::TotalEntries, 3);
        prop_assert_eq!(out.score, 0.0);
        prop_assert_eq!(out.risk_tier, RiskTier::Low);
    }
}
