// =============================================================================
// Prediction Performance Metrics
// =============================================================================
//
// Offline evaluation of a predictor against realized values. The engine never
// calls this itself; callers replaying stored predictions use it to compare
// policies before swapping one in.

use serde::{Deserialize, Serialize};

/// Aggregate quality measures over aligned prediction/actual slices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub mean_squared_error: f64,
    pub mean_absolute_error: f64,
    /// Fraction of predictions whose sign matched the realized sign.
    pub direction_accuracy: f64,
    pub total_predictions: usize,
}

impl PerformanceMetrics {
    /// Evaluate `predictions` against `actuals`.
    ///
    /// Returns `None` when the slices are empty or of different lengths.
    pub fn evaluate(predictions: &[f64], actuals: &[f64]) -> Option<Self> {
        if predictions.is_empty() || predictions.len() != actuals.len() {
            return None;
        }

        let n = predictions.len() as f64;
        let mut squared = 0.0_f64;
        let mut absolute = 0.0_f64;
        let mut direction_hits = 0_usize;

        for (&p, &a) in predictions.iter().zip(actuals.iter()) {
            let diff = p - a;
            squared += diff * diff;
            absolute += diff.abs();
            if (p > 0.0) == (a > 0.0) {
                direction_hits += 1;
            }
        }

        Some(Self {
            mean_squared_error: squared / n,
            mean_absolute_error: absolute / n,
            direction_accuracy: direction_hits as f64 / n,
            total_predictions: predictions.len(),
        })
    }
}
