//! Integration tests for the statistical analyzers.

use audit_stats::{
    BenfordOptions, ConcentrationLevel, ConformityLevel, analyze, analyze_with, compute_hhi,
};
use insta::assert_json_snapshot;
use proptest::prelude::*;

#[test]
fn all_nines_is_nonconforming() {
    // 1000 amounts, every one led by a 9, spanning 9 to 9999.
    let amounts: Vec<f64> = (0..1000)
        .map(|i| 9.0 * 10f64.powi(i % 4) + f64::from(i % 10) * 0.01)
        .collect();
    let result = analyze(&amounts, amounts.len());

    assert!(result.passed_prechecks);
    assert_eq!(result.eligible_count, 1000);
    assert_eq!(result.actual_distribution[&9], 1.0);
    assert_eq!(result.conformity_level, Some(ConformityLevel::Nonconforming));
    assert_eq!(result.most_deviated_digits.first(), Some(&9));
    assert_eq!(result.over_represented_digits(), vec![9]);
}

#[test]
fn benford_like_population_conforms() {
    // Geometric sequence over six decades approximates the expected law.
    let amounts: Vec<f64> = (0..2000)
        .map(|i| 10f64.powf(f64::from(i) * 6.0 / 2000.0))
        .collect();
    let result = analyze(&amounts, amounts.len());
    assert!(result.passed_prechecks);
    assert_eq!(result.conformity_level, Some(ConformityLevel::Conforming));
}

#[test]
fn not_applicable_result_serializes() {
    let result = analyze(&[10.0, 200.0, 3000.0], 5);
    assert_json_snapshot!(
        serde_json::json!({
            "passed_prechecks": result.passed_prechecks,
            "precheck_message": result.precheck_message,
            "total_count": result.total_count,
            "eligible_count": result.eligible_count,
        }),
        @r#"
    {
      "eligible_count": 3,
      "passed_prechecks": false,
      "precheck_message": "Benford analysis needs at least 500 positive amounts; found 3",
      "total_count": 5
    }
    "#
    );
}

#[test]
fn hhi_result_serializes_rounded() {
    let result = compute_hhi(&[5.0, 3.0, 1.0]);
    assert_eq!(result.concentration_level, ConcentrationLevel::Concentrated);
    assert_json_snapshot!(result, @r#"
    {
      "hhi": 4320.9877,
      "concentration_level": "concentrated",
      "top_share_pct": 55.6,
      "effective_n": 2.3143,
      "entity_count": 3
    }
    "#);
}

proptest! {
    #[test]
    fn small_populations_never_pass(
        amounts in prop::collection::vec(-1e6f64..1e6, 0..100),
        min_entries in 100usize..1000,
    ) {
        let options = BenfordOptions { min_entries, ..BenfordOptions::default() };
        let result = analyze_with(&amounts, amounts.len(), options);
        prop_assert!(!result.passed_prechecks);
        prop_assert!(result.precheck_message.is_some());
        prop_assert!(result.conformity_level.is_none());
    }

    #[test]
    fn hhi_is_bounded(shares in prop::collection::vec(-10.0f64..1e9, 0..50)) {
        let result = compute_hhi(&shares);
        prop_assert!((0.0..=10_000.0).contains(&result.hhi));
        prop_assert!((0.0..=100.0 + 1e-9).contains(&result.top_share_pct));
        if result.entity_count > 0 {
            // Index is never below that of an even split.
            let floor = 10_000.0 / result.entity_count as f64;
            prop_assert!(result.hhi + 1e-6 >= floor);
        }
    }

    #[test]
    fn single_positive_share_is_maximal(x in 1e-6f64..1e12) {
        let result = compute_hhi(&[x]);
        prop_assert!((result.hhi - 10_000.0).abs() < 1e-6);
        prop_assert_eq!(result.concentration_level, ConcentrationLevel::Concentrated);
    }

    #[test]
    fn hhi_ignores_the_scale_of_shares(
        shares in prop::collection::vec(1e-3f64..1e3, 2..20),
        exponent in 0i32..300,
    ) {
        let scale = 10f64.powi(exponent);
        let scaled: Vec<f64> = shares.iter().map(|s| s * scale).collect();
        let base = compute_hhi(&shares);
        let result = compute_hhi(&scaled);
        prop_assert_eq!(result.entity_count, shares.len());
        prop_assert!((result.hhi - base.hhi).abs() < 1e-6 * base.hhi);
    }
}
