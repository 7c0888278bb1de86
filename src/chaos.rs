// =============================================================================
// Chaos Threshold Modulator — logistic-map threshold perturbation
// =============================================================================
//
// A logistic map x <- r * x * (1 - x), seeded at x0 = 0.5, perturbs the base
// Hurst threshold:
//
//   threshold[i] = hurst_threshold + step * x * sin(pi * entropy)
//
// The entropy here is a single global value derived from the whole-series
// volatility, not a per-index statistic. The map advances only at indices
// where the Hurst value is defined; other indices keep the base threshold.
// At r = 4 the map is fully chaotic yet deterministic given the seed.

use std::f64::consts::PI;

use tracing::trace;

use crate::config::EngineConfig;
use crate::volatility::volatility_entropy;

/// Initial state of the logistic map.
const INITIAL_STATE: f64 = 0.5;

/// Time-varying decision thresholds plus the final state of the map.
#[derive(Debug, Clone)]
pub struct ChaosModulation {
    pub thresholds: Vec<f64>,
    pub final_state: f64,
}

pub fn modulate_threshold(
    hurst: &[f64],
    log_returns: &[f64],
    config: &EngineConfig,
) -> ChaosModulation {
    let n = hurst.len();
    let entropy = volatility_entropy(log_returns);

    let mut thresholds = vec![config.hurst_threshold; n];
    let mut x = INITIAL_STATE;

    for i in 0..n {
        if !hurst[i].is_finite() {
            continue;
        }
        x = config.chaos_parameter * x * (1.0 - x);
        thresholds[i] = config.hurst_threshold + config.chaos_step * x * (PI * entropy).sin();
    }

    trace!(
        entropy = format!("{:.6}", entropy),
        final_state = format!("{:.6}", x),
        "chaos modulation complete"
    );

    ChaosModulation {
        thresholds,
        final_state: x,
    }
}
