//! Property and integration tests for column detection.

use std::collections::BTreeSet;

use audit_map::{ColumnDetector, ColumnFieldConfig, detect_columns, profiles};
use proptest::prelude::*;

fn small_profile() -> Vec<ColumnFieldConfig> {
    vec![
        ColumnFieldConfig::new("date", 0)
            .partial("date", 0.8)
            .required("No date column"),
        ColumnFieldConfig::new("debit", 1).partial("debit", 0.9),
        ColumnFieldConfig::new("credit", 1).partial("credit", 0.9),
        ColumnFieldConfig::new("amount", 2)
            .partial("amount", 0.7)
            .partial("amt", 0.5),
        ColumnFieldConfig::new("vendor", 3)
            .partial("vendor|supplier", 0.8)
            .required("No vendor column"),
    ]
}

fn header_strategy() -> impl Strategy<Value = Vec<String>> {
    let words = prop::sample::select(vec![
        "date", "debit", "credit", "amount", "amt", "vendor", "supplier", "memo", "posting",
        "net", "id",
    ]);
    prop::collection::vec(
        prop::collection::vec(words, 1..3).prop_map(|parts| parts.join(" ")),
        0..8,
    )
}

proptest! {
    #[test]
    fn every_column_is_assigned_at_most_once(headers in header_strategy()) {
        let detector = ColumnDetector::new(small_profile()).unwrap();
        let result = detector.detect(&headers, 0.0);

        // Count how many fields claim each physical column position.
        let mut claims = vec![0usize; headers.len()];
        for assignment in result.assignments.values() {
            let position = headers
                .iter()
                .enumerate()
                .position(|(i, h)| h == &assignment.column && claims[i] == 0);
            prop_assert!(position.is_some(), "assigned column must be a unique header");
            claims[position.unwrap()] += 1;
        }
        prop_assert!(claims.iter().all(|&c| c <= 1));
    }

    #[test]
    fn missing_required_fields_are_noted(headers in header_strategy()) {
        let result = detect_columns(&headers, small_profile(), 0.0).unwrap();
        for (field, note) in [("date", "No date column"), ("vendor", "No vendor column")] {
            if !result.is_assigned(field) {
                prop_assert!(result.detection_notes.iter().any(|n| n == note));
                prop_assert!(result.missing_required.iter().any(|m| m == field));
            }
        }
    }
}

#[test]
fn test_unassigned_fields_never_raise() {
    let result = detect_columns(&[], small_profile(), 0.0).unwrap();
    assert!(result.assignments.is_empty());
    assert_eq!(result.missing_required.len(), 2);
}

#[test]
fn test_detection_serializes() {
    let detector = ColumnDetector::new(profiles::journal_entry()).unwrap();
    let headers: Vec<String> = ["Date", "Amount"].iter().map(|s| s.to_string()).collect();
    let result = detector.detect(&headers, 0.0);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["assignments"]["amount"]["column"], "Amount");
    assert_eq!(json["assignments"]["amount"]["source"], "detected");
    assert_eq!(json["all_columns"].as_array().unwrap().len(), 2);

    let claimed: BTreeSet<&str> = result
        .assignments
        .values()
        .map(|a| a.column.as_str())
        .collect();
    assert_eq!(claimed.len(), result.assignments.len());
}
