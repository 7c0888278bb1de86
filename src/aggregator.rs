// =============================================================================
// Signal Aggregator — final BUY / SELL / HOLD arbitration
// =============================================================================
//
// Combines the last values of every indicator series into one decision.
// Undefined last values resolve to safe defaults here and nowhere earlier:
// hurst-like series to 0.5, particle volatility to 0.02, the dynamic
// threshold to the configured base.
//
// Buy conditions (5): hurst above the dynamic threshold, uptrend component
// dominant, volatility below its historical percentile, predictor BUY,
// upside semivariance dominant.
// Sell conditions (4): hurst below the inverse threshold, downtrend
// component dominant, predictor SELL, volatility above the absolute floor.
//
// BUY is evaluated before SELL:
//
//   buy_score  >= 3  =>  BUY,  confidence = min(0.95, 0.5 + 0.15 * buy_score)
//   sell_score >= 2  =>  SELL, confidence = min(0.85, 0.4 + 0.2 * sell_score)
//   otherwise        =>  HOLD, confidence = 0.5
//
// The decision is terminal per call; nothing persists across calls.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{MarketRegime, RiskLevel, Signal};

const BUY_SCORE_FLOOR: usize = 3;
const SELL_SCORE_FLOOR: usize = 2;

/// Absolute particle-volatility level treated as distressed.
const ELEVATED_VOLATILITY_FLOOR: f64 = 0.08;

/// Defaults used when a last value is undefined.
const DEFAULT_HURST: f64 = 0.5;
const DEFAULT_VOLATILITY: f64 = 0.02;

/// Every condition boolean plus both scores, shipped with the result so
/// callers can see exactly which conditions fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalComponents {
    // Buy side.
    pub hurst_above_threshold: bool,
    pub uptrend_dominant: bool,
    pub volatility_below_quantile: bool,
    pub predictor_buy: bool,
    pub upside_semivariance_dominant: bool,
    // Sell side.
    pub hurst_below_inverse_threshold: bool,
    pub downtrend_dominant: bool,
    pub predictor_sell: bool,
    pub volatility_elevated: bool,
    // Scores.
    pub buy_score: usize,
    pub sell_score: usize,
}

/// Final arbitration output.
#[derive(Debug, Clone, Copy)]
pub struct AggregateDecision {
    pub signal: Signal,
    pub confidence: f64,
    pub components: SignalComponents,
}

/// Borrowed view of everything the aggregator reads.
pub struct AggregationInputs<'a> {
    pub hurst: &'a [f64],
    pub hurst_up: &'a [f64],
    pub hurst_down: &'a [f64],
    pub particle_volatility: &'a [f64],
    pub dynamic_thresholds: &'a [f64],
    pub upside_semivariance: &'a [f64],
    pub downside_semivariance: &'a [f64],
    pub predictor_signal: Signal,
    /// Fallback when the dynamic threshold series is undefined at the end.
    pub hurst_threshold: f64,
    /// Percentile of the particle-volatility history for the calm condition.
    pub volatility_quantile: f64,
}

pub fn aggregate(inputs: &AggregationInputs<'_>) -> AggregateDecision {
    let current_hurst = last_or(inputs.hurst, DEFAULT_HURST);
    let current_up = last_or(inputs.hurst_up, DEFAULT_HURST);
    let current_down = last_or(inputs.hurst_down, DEFAULT_HURST);
    let current_vol = last_or(inputs.particle_volatility, DEFAULT_VOLATILITY);
    let current_threshold = last_or(inputs.dynamic_thresholds, inputs.hurst_threshold);
    let rsv_up = last_or(inputs.upside_semivariance, 0.0);
    let rsv_down = last_or(inputs.downside_semivariance, 0.0);

    // Calm condition is false outright when no volatility history exists.
    let volatility_below_quantile =
        match percentile(inputs.particle_volatility, inputs.volatility_quantile) {
            Some(ceiling) => current_vol < ceiling,
            None => false,
        };

    let components = SignalComponents {
        hurst_above_threshold: current_hurst > current_threshold,
        uptrend_dominant: current_up > current_down,
        volatility_below_quantile,
        predictor_buy: inputs.predictor_signal == Signal::Buy,
        upside_semivariance_dominant: rsv_up > rsv_down,
        hurst_below_inverse_threshold: current_hurst < 1.0 - current_threshold,
        downtrend_dominant: current_down > current_up,
        predictor_sell: inputs.predictor_signal == Signal::Sell,
        volatility_elevated: current_vol > ELEVATED_VOLATILITY_FLOOR,
        buy_score: 0,
        sell_score: 0,
    };

    let buy_score = [
        components.hurst_above_threshold,
        components.uptrend_dominant,
        components.volatility_below_quantile,
        components.predictor_buy,
        components.upside_semivariance_dominant,
    ]
    .iter()
    .filter(|&&c| c)
    .count();

    let sell_score = [
        components.hurst_below_inverse_threshold,
        components.downtrend_dominant,
        components.predictor_sell,
        components.volatility_elevated,
    ]
    .iter()
    .filter(|&&c| c)
    .count();

    let components = SignalComponents {
        buy_score,
        sell_score,
        ..components
    };

    let (signal, confidence) = if buy_score >= BUY_SCORE_FLOOR {
        (
            Signal::Buy,
            (0.5 + 0.15 * buy_score as f64).min(0.95),
        )
    } else if sell_score >= SELL_SCORE_FLOOR {
        (
            Signal::Sell,
            (0.4 + 0.2 * sell_score as f64).min(0.85),
        )
    } else {
        (Signal::Hold, 0.5)
    };

    debug!(
        signal = %signal,
        confidence = format!("{:.2}", confidence),
        buy_score,
        sell_score,
        hurst = format!("{:.4}", current_hurst),
        volatility = format!("{:.4}", current_vol),
        threshold = format!("{:.4}", current_threshold),
        "signal aggregated"
    );

    AggregateDecision {
        signal,
        confidence,
        components,
    }
}

/// Market regime from the last values of the hurst and particle-volatility
/// series (undefined values resolve to the shared defaults).
pub fn classify_regime(hurst: &[f64], particle_volatility: &[f64]) -> MarketRegime {
    let hurst = last_or(hurst, DEFAULT_HURST);
    let volatility = last_or(particle_volatility, DEFAULT_VOLATILITY);

    if hurst > 0.7 && volatility < 0.05 {
        MarketRegime::TrendingLowVol
    } else if hurst < 0.3 && volatility > 0.08 {
        MarketRegime::MeanRevertingHighVol
    } else if volatility > 0.1 {
        MarketRegime::HighVolatility
    } else {
        MarketRegime::Normal
    }
}

/// Risk classification from the last values of the particle-volatility and
/// hurst series.
pub fn assess_risk(particle_volatility: &[f64], hurst: &[f64]) -> RiskLevel {
    let volatility = last_or(particle_volatility, DEFAULT_VOLATILITY);
    let hurst = last_or(hurst, DEFAULT_HURST);

    if volatility > 0.1 || hurst < 0.2 {
        RiskLevel::High
    } else if volatility < 0.03 && hurst > 0.6 {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    }
}

/// Last value of a series, or `default` when the series is empty or ends
/// undefined.
pub fn last_or(series: &[f64], default: f64) -> f64 {
    match series.last() {
        Some(&v) if v.is_finite() => v,
        _ => default,
    }
}

/// Linear-interpolation percentile over the defined values of a series.
fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    Some(sorted[lower] + frac * (sorted[upper] - sorted[lower]))
}
