//! Z-score helpers for amount outliers.

use audit_model::Severity;

/// z above which an outlier is high severity.
pub const HIGH_Z: f64 = 5.0;
/// z above which an outlier is medium severity.
pub const MEDIUM_Z: f64 = 4.0;

/// Map a z-score to a severity.
///
/// The score is taken as given; callers that treat deviations in both
/// directions pass `z.abs()`.
pub fn zscore_to_severity(z: f64) -> Severity {
    if z > HIGH_Z {
        Severity::High
    } else if z > MEDIUM_Z {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Standard score of `value`; 0 when the deviation is zero or undefined.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }
    (value - mean) / std_dev
}

/// Population mean and standard deviation over finite values.
///
/// Returns `(0.0, 0.0)` when there are none.
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return (0.0, 0.0);
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
