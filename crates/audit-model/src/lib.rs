pub mod error;
pub mod finding;
pub mod rounding;
pub mod severity;
pub mod table;

pub use error::{ModelError, Result, ensure_in_range};
pub use finding::{FlaggedEntry, TestResult};
pub use rounding::{round_fraction, round_score, round_to};
pub use severity::{RiskTier, Severity, TestTier, score_to_risk_tier};
pub use table::{AnalysisInput, CellValue, Row};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_counts_distinct_rows() {
        let result = TestResult::new(
            "round_amounts",
            "Round Amounts",
            TestTier::Structural,
            Severity::Low,
            10,
            vec![
                FlaggedEntry::new(1, Severity::Low, "round"),
                FlaggedEntry::new(1, Severity::Medium, "very round"),
                FlaggedEntry::new(4, Severity::Low, "round"),
            ],
        );
        assert_eq!(result.entries_flagged, 2);
        assert!((result.flag_rate - 0.2).abs() < 1e-12);
        assert_eq!(result.count_by_severity(Severity::Low), 2);
    }

    #[test]
    fn empty_population_has_zero_rate() {
        let result = TestResult::new(
            "empty",
            "Empty",
            TestTier::Statistical,
            Severity::High,
            0,
            Vec::new(),
        );
        assert_eq!(result.flag_rate, 0.0);
        assert_eq!(result.entries_flagged, 0);
    }

    #[test]
    fn range_check_rejects_nan() {
        assert!(ensure_in_range("rate", f64::NAN, 0.0, 1.0).is_err());
        assert!(ensure_in_range("rate", 0.5, 0.0, 1.0).is_ok());
        let err = ensure_in_range("rate", 1.5, 0.0, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "rate must be within [0, 1], got 1.5");
    }
}
