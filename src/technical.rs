// =============================================================================
// Technical Analysis Engine — classic-indicator baseline variant
// =============================================================================
//
// A deliberately conventional engine kept beside the quantum pipeline for
// comparison: moving-average crossover, Wilder RSI, MACD and Bollinger Bands,
// voted into a BUY / SELL / HOLD call. It shares the `AnalysisResult`
// contract; fields only the quantum pipeline can fill stay undefined.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::aggregator::{assess_risk, classify_regime};
use crate::engine::{AnalysisResult, EngineInfo};
use crate::error::Result;
use crate::patterns::detect_pattern;
use crate::types::{EngineKind, PriceSeries, Signal, MINIMUM_REQUIRED_POINTS};

const FAST_SMA_PERIOD: usize = 20;
const SLOW_SMA_PERIOD: usize = 50;
const RSI_PERIOD: usize = 14;
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_STD: f64 = 2.0;

/// Indicator values and the boolean signals derived from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,

    pub ma_crossover_bullish: bool,
    pub rsi_oversold: bool,
    pub rsi_overbought: bool,
    pub macd_bullish: bool,
    pub below_lower_band: bool,
    pub above_upper_band: bool,
}

impl TechnicalSnapshot {
    /// Compute every indicator over the closing prices.
    pub fn compute(closes: &[f64]) -> Self {
        let sma_fast = sma(closes, FAST_SMA_PERIOD);
        let sma_slow = sma(closes, SLOW_SMA_PERIOD);
        let rsi = wilder_rsi(closes, RSI_PERIOD);
        let macd = macd_line(closes);
        let bands = bollinger_bands(closes, BOLLINGER_PERIOD, BOLLINGER_STD);
        let last_close = closes.last().copied();

        let ma_crossover_bullish = matches!((sma_fast, sma_slow), (Some(f), Some(s)) if f > s);
        let rsi_oversold = rsi.is_some_and(|r| r < RSI_OVERSOLD);
        let rsi_overbought = rsi.is_some_and(|r| r > RSI_OVERBOUGHT);
        let macd_bullish = macd.is_some_and(|m| m > 0.0);
        let below_lower_band = matches!(
            (last_close, bands),
            (Some(c), Some((_, lower))) if c < lower
        );
        let above_upper_band = matches!(
            (last_close, bands),
            (Some(c), Some((upper, _))) if c > upper
        );

        Self {
            sma_fast,
            sma_slow,
            rsi,
            macd,
            bollinger_upper: bands.map(|(upper, _)| upper),
            bollinger_lower: bands.map(|(_, lower)| lower),
            ma_crossover_bullish,
            rsi_oversold,
            rsi_overbought,
            macd_bullish,
            below_lower_band,
            above_upper_band,
        }
    }

    /// Vote the boolean signals into a directional call.
    ///
    /// Bullish: crossover, oversold RSI, positive MACD, close under the lower
    /// band. Bearish: overbought RSI, close over the upper band, negative
    /// MACD. Two clear net votes make a signal.
    pub fn vote(&self) -> (Signal, f64) {
        let bullish = [
            self.ma_crossover_bullish,
            self.rsi_oversold,
            self.macd_bullish,
            self.below_lower_band,
        ]
        .iter()
        .filter(|&&v| v)
        .count() as i64;

        let bearish = [
            self.rsi_overbought,
            self.above_upper_band,
            self.macd.is_some_and(|m| m < 0.0),
        ]
        .iter()
        .filter(|&&v| v)
        .count() as i64;

        let net = bullish - bearish;
        if net >= 2 {
            (Signal::Buy, (0.5 + 0.1 * net as f64).min(0.9))
        } else if net <= -2 {
            (Signal::Sell, (0.5 + 0.1 * (-net) as f64).min(0.9))
        } else {
            (Signal::Hold, 0.5)
        }
    }
}

// =============================================================================
// Indicator helpers
// =============================================================================

/// Simple moving average of the trailing `period` closes.
fn sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Full EMA series seeded with the SMA of the first `period` values.
fn ema_series(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period + 1) as f64;
    let seed: f64 = closes[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(closes.len() - period + 1);
    result.push(seed);

    let mut prev = seed;
    for &close in &closes[period..] {
        prev = close * multiplier + prev * (1.0 - multiplier);
        result.push(prev);
    }
    result
}

/// MACD line: EMA(12) - EMA(26) at the latest close.
fn macd_line(closes: &[f64]) -> Option<f64> {
    let fast = ema_series(closes, MACD_FAST);
    let slow = ema_series(closes, MACD_SLOW);
    Some(fast.last()? - slow.last()?)
}

/// Wilder-smoothed RSI at the latest close.
fn wilder_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let (mut avg_gain, mut avg_loss) = deltas[..period]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l + d.abs())
            }
        });
    let period_f = period as f64;
    avg_gain /= period_f;
    avg_loss /= period_f;

    for &delta in &deltas[period..] {
        let (gain, loss) = if delta > 0.0 {
            (delta, 0.0)
        } else {
            (0.0, delta.abs())
        };
        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
    }

    if avg_loss < f64::EPSILON {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Upper and lower Bollinger Bands over the trailing window.
fn bollinger_bands(closes: &[f64], period: usize, num_std: f64) -> Option<(f64, f64)> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();
    Some((middle + num_std * std_dev, middle - num_std * std_dev))
}

// =============================================================================
// TechnicalEngine
// =============================================================================

/// Classic-indicator engine. Stateless; nothing survives a call.
#[derive(Debug, Clone, Default)]
pub struct TechnicalEngine;

impl TechnicalEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            name: "Technical Analysis Engine",
            version: "1.0",
            kind: EngineKind::Technical,
            required_data_points: MINIMUM_REQUIRED_POINTS,
        }
    }

    /// Compute the indicator snapshot and directional vote for a series.
    pub fn snapshot(&self, series: &PriceSeries) -> TechnicalSnapshot {
        let closes = series.closes();
        let snapshot = TechnicalSnapshot::compute(&closes);
        let (signal, confidence) = snapshot.vote();
        debug!(
            signal = %signal,
            confidence = format!("{:.2}", confidence),
            rsi = format!("{:?}", snapshot.rsi.map(|r| (r * 100.0).round() / 100.0)),
            "technical snapshot computed"
        );
        snapshot
    }

    /// Produce the shared result contract from the indicator snapshot.
    /// Fields only the quantum pipeline can fill stay `None`.
    pub fn analyze(&self, series: &PriceSeries) -> Result<AnalysisResult> {
        let snapshot = self.snapshot(series);
        let (signal, confidence) = snapshot.vote();
        let pattern = detect_pattern(series.bars());

        let action_probabilities = match signal {
            Signal::Buy => [confidence, (1.0 - confidence) / 2.0, (1.0 - confidence) / 2.0],
            Signal::Sell => [(1.0 - confidence) / 2.0, confidence, (1.0 - confidence) / 2.0],
            Signal::Hold => [(1.0 - confidence) / 2.0, (1.0 - confidence) / 2.0, confidence],
        };

        Ok(AnalysisResult {
            analysis_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_kind: EngineKind::Technical,
            last_log_return: None,
            rolling_volatility: None,
            rolling_entropy: None,
            hurst_exponent: None,
            hurst_uptrend: None,
            hurst_downtrend: None,
            particle_volatility: None,
            upside_semivariance: None,
            downside_semivariance: None,
            dynamic_hurst_threshold: None,
            directional_signal: signal,
            directional_confidence: confidence,
            action_probabilities,
            candlestick_pattern: pattern.pattern,
            pattern_confidence: pattern.confidence,
            final_signal: signal,
            signal_confidence: confidence,
            signal_components: None,
            volatility_entropy: None,
            fractal_dimension: None,
            chaos_state: None,
            market_regime: classify_regime(&[], &[]),
            risk_level: assess_risk(&[], &[]),
            technical: Some(snapshot),
        })
    }
}
