// =============================================================================
// Error types
// =============================================================================
//
// Validation failures are raised before any computation begins and are never
// recovered internally. Numeric edge cases inside the estimators do NOT
// surface here — insufficient history, zero fluctuation and degenerate ratios
// propagate as NaN through the intermediate series instead (resolved to safe
// defaults only by the predictor feature window and the final aggregator).

use thiserror::Error;

/// Typed error hierarchy for the quantum engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("price series too short: {actual} bars (minimum {required})")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("config out of range: {field} = {value} (allowed {min} to {max})")]
    ConfigOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
