// =============================================================================
// Directional Predictor — pluggable policy over recent indicator state
// =============================================================================
//
// The predictor consumes a fixed-size window of the most recent indicator
// values and emits a directional forecast with a confidence and a 3-way
// action distribution. The trait seam exists so a trained policy can replace
// the rule table without touching the engine contract; the shipped
// implementation is an explicitly rule-based stand-in.

use serde::{Deserialize, Serialize};

use crate::types::Signal;

/// Number of trailing samples exposed to the predictor.
pub const FEATURE_WINDOW: usize = 5;

/// Defaults substituted for undefined entries.
const DEFAULT_HURST: f64 = 0.5;
const DEFAULT_VOLATILITY: f64 = 0.02;
const DEFAULT_RETURN: f64 = 0.0;

/// Volatility below which a persistent market is considered calm enough to
/// buy, and above which everything reads as distressed.
const CALM_VOLATILITY_CEILING: f64 = 0.05;
const ELEVATED_VOLATILITY_FLOOR: f64 = 0.08;

/// The last [`FEATURE_WINDOW`] samples of each indicator series, oldest
/// first, with undefined entries already resolved to safe defaults.
#[derive(Debug, Clone)]
pub struct FeatureWindow {
    pub hurst: [f64; FEATURE_WINDOW],
    pub hurst_up: [f64; FEATURE_WINDOW],
    pub hurst_down: [f64; FEATURE_WINDOW],
    pub particle_volatility: [f64; FEATURE_WINDOW],
    pub log_returns: [f64; FEATURE_WINDOW],
}

impl FeatureWindow {
    /// Build the window from full-length series, taking the trailing
    /// [`FEATURE_WINDOW`] entries of each and substituting defaults for NaN
    /// or missing values.
    pub fn from_series(
        hurst: &[f64],
        hurst_up: &[f64],
        hurst_down: &[f64],
        particle_volatility: &[f64],
        log_returns: &[f64],
    ) -> Self {
        Self {
            hurst: tail_with_default(hurst, DEFAULT_HURST),
            hurst_up: tail_with_default(hurst_up, DEFAULT_HURST),
            hurst_down: tail_with_default(hurst_down, DEFAULT_HURST),
            particle_volatility: tail_with_default(particle_volatility, DEFAULT_VOLATILITY),
            log_returns: tail_with_default(log_returns, DEFAULT_RETURN),
        }
    }

    /// Most recent Hurst value.
    pub fn last_hurst(&self) -> f64 {
        self.hurst[FEATURE_WINDOW - 1]
    }

    /// Most recent particle-volatility value.
    pub fn last_volatility(&self) -> f64 {
        self.particle_volatility[FEATURE_WINDOW - 1]
    }
}

fn tail_with_default(series: &[f64], default: f64) -> [f64; FEATURE_WINDOW] {
    let mut out = [default; FEATURE_WINDOW];
    let take = series.len().min(FEATURE_WINDOW);
    let tail = &series[series.len() - take..];
    for (slot, &value) in out[FEATURE_WINDOW - take..].iter_mut().zip(tail.iter()) {
        if value.is_finite() {
            *slot = value;
        }
    }
    out
}

/// Directional forecast: signal, confidence in [0, 1], and the probability
/// assigned to each action as [buy, sell, hold] (summing to 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionalForecast {
    pub signal: Signal,
    pub confidence: f64,
    pub action_probabilities: [f64; 3],
}

/// Policy seam: anything that maps a feature window to a forecast.
pub trait DirectionalPredictor: Send + Sync {
    fn predict(&self, features: &FeatureWindow) -> DirectionalForecast;
}

/// Rule-based placeholder policy.
///
/// Buys into persistent, calm markets; sells anti-persistent or distressed
/// ones; holds otherwise.
#[derive(Debug, Clone)]
pub struct ThresholdRulePredictor {
    hurst_threshold: f64,
}

impl ThresholdRulePredictor {
    pub fn new(hurst_threshold: f64) -> Self {
        Self { hurst_threshold }
    }
}

impl DirectionalPredictor for ThresholdRulePredictor {
    fn predict(&self, features: &FeatureWindow) -> DirectionalForecast {
        let hurst = features.last_hurst();
        let volatility = features.last_volatility();

        if hurst > self.hurst_threshold && volatility < CALM_VOLATILITY_CEILING {
            DirectionalForecast {
                signal: Signal::Buy,
                confidence: 0.7,
                action_probabilities: [0.7, 0.15, 0.15],
            }
        } else if hurst < (1.0 - self.hurst_threshold) || volatility > ELEVATED_VOLATILITY_FLOOR {
            DirectionalForecast {
                signal: Signal::Sell,
                confidence: 0.6,
                action_probabilities: [0.15, 0.7, 0.15],
            }
        } else {
            DirectionalForecast {
                signal: Signal::Hold,
                confidence: 0.5,
                action_probabilities: [0.2, 0.2, 0.6],
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn window(hurst: f64, volatility: f64) -> FeatureWindow {
        FeatureWindow {
            hurst: [hurst; FEATURE_WINDOW],
            hurst_up: [DEFAULT_HURST; FEATURE_WINDOW],
            hurst_down: [DEFAULT_HURST; FEATURE_WINDOW],
            particle_volatility: [volatility; FEATURE_WINDOW],
            log_returns: [0.0; FEATURE_WINDOW],
        }
    }

    #[test]
    fn persistent_calm_market_is_a_buy() {
        let predictor = ThresholdRulePredictor::new(0.65);
        let forecast = predictor.predict(&window(0.75, 0.02));
        assert_eq!(forecast.signal, Signal::Buy);
        assert!((forecast.confidence - 0.7).abs() < f64::EPSILON);
        assert_eq!(forecast.action_probabilities, [0.7, 0.15, 0.15]);
    }

    #[test]
    fn anti_persistent_market_is_a_sell() {
        let predictor = ThresholdRulePredictor::new(0.65);
        let forecast = predictor.predict(&window(0.30, 0.02));
        assert_eq!(forecast.signal, Signal::Sell);
        assert!((forecast.confidence - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn elevated_volatility_is_a_sell_regardless_of_hurst() {
        let predictor = ThresholdRulePredictor::new(0.65);
        let forecast = predictor.predict(&window(0.75, 0.12));
        assert_eq!(forecast.signal, Signal::Sell);
    }

    #[test]
    fn ambiguous_state_holds() {
        let predictor = ThresholdRulePredictor::new(0.65);
        let forecast = predictor.predict(&window(0.5, 0.06));
        assert_eq!(forecast.signal, Signal::Hold);
        assert_eq!(forecast.action_probabilities, [0.2, 0.2, 0.6]);
    }

    #[test]
    fn action_probabilities_sum_to_one() {
        let predictor = ThresholdRulePredictor::new(0.65);
        for (h, v) in [(0.75, 0.02), (0.30, 0.02), (0.5, 0.06)] {
            let forecast = predictor.predict(&window(h, v));
            let sum: f64 = forecast.action_probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn feature_window_substitutes_defaults_for_nan() {
        let hurst = vec![f64::NAN; 10];
        let vol = vec![f64::NAN; 10];
        let zeros = vec![0.0; 10];
        let features = FeatureWindow::from_series(&hurst, &hurst, &hurst, &vol, &zeros);
        assert!((features.last_hurst() - DEFAULT_HURST).abs() < f64::EPSILON);
        assert!((features.last_volatility() - DEFAULT_VOLATILITY).abs() < f64::EPSILON);
    }

    #[test]
    fn feature_window_takes_the_trailing_samples() {
        let hurst: Vec<f64> = (0..10).map(|i| i as f64 / 10.0).collect();
        let vol = vec![0.03; 10];
        let zeros = vec![0.0; 10];
        let features = FeatureWindow::from_series(&hurst, &hurst, &hurst, &vol, &zeros);
        // Oldest-first tail: indices 5..10.
        assert!((features.hurst[0] - 0.5).abs() < f64::EPSILON);
        assert!((features.last_hurst() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn feature_window_pads_short_series_with_defaults() {
        let short = vec![0.8; 2];
        let vol = vec![0.03; 2];
        let zeros = vec![0.0; 2];
        let features = FeatureWindow::from_series(&short, &short, &short, &vol, &zeros);
        assert!((features.hurst[0] - DEFAULT_HURST).abs() < f64::EPSILON);
        assert!((features.hurst[4] - 0.8).abs() < f64::EPSILON);
    }
}
