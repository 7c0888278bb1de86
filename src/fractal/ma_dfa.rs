// =============================================================================
// Adaptive Hurst Estimator — MA-DFA with entropy/fractal window feedback
// =============================================================================
//
// Moving-window detrended fluctuation analysis. For each index i:
//
//   1. fractal_dim   = 2 - hurst[i-1]   (2.0 when the previous value is
//                                        undefined, including i = 0)
//   2. rolling vol   = population std of the trailing 20 log returns
//   3. entropy[i]    = -vol[i] * ln(vol[i] + 1e-10)
//   4. window        = clip(round(base * exp(-w_e * entropy[i]/entropy_mean
//                                            + w_f / fractal_dim)), 10, 50)
//   5. fluctuation   = RMS of residuals after degree-1 detrending of the
//                      trailing `window` closes
//   6. hurst[i]      = ln(fluctuation) / ln(window)   when fluctuation > 0
//
// `entropy_mean` is computed once over every defined entropy value of the
// whole series, so the per-index window depends on a global statistic.
//
// The recursion through hurst[i-1] makes this a strictly ordered fold: it
// must never be evaluated as an independent per-index map. Concurrency, if
// needed, belongs at the per-symbol level.
//
// Undefined values are carried as NaN and propagate arithmetically.

use tracing::trace;

use crate::config::EngineConfig;

/// Trailing window for the rolling volatility feeding the entropy term.
const ROLLING_VOL_WINDOW: usize = 20;

/// Hard bounds of the adaptive regression window.
const MIN_WINDOW: usize = 10;
const MAX_WINDOW: usize = 50;

/// Guard added inside the entropy logarithm.
const ENTROPY_EPSILON: f64 = 1e-10;

/// Full per-index output of the adaptive Hurst pass. All vectors have the
/// same length as the input; NaN marks indices without enough history.
#[derive(Debug, Clone)]
pub struct FractalSeries {
    pub hurst: Vec<f64>,
    pub fluctuations: Vec<f64>,
    pub rolling_volatility: Vec<f64>,
    pub entropy: Vec<f64>,
}

/// Run the adaptive Hurst estimation over a cleaned close series.
///
/// `closes` and `log_returns` must have equal length (guaranteed by the
/// preprocessor).
pub fn estimate_adaptive_hurst(
    closes: &[f64],
    log_returns: &[f64],
    config: &EngineConfig,
) -> FractalSeries {
    let n = closes.len();

    let rolling_volatility = rolling_std(log_returns, ROLLING_VOL_WINDOW);
    let entropy: Vec<f64> = rolling_volatility
        .iter()
        .map(|&v| -v * (v + ENTROPY_EPSILON).ln())
        .collect();

    let defined: Vec<f64> = entropy.iter().copied().filter(|e| e.is_finite()).collect();
    let entropy_mean = if defined.is_empty() {
        f64::NAN
    } else {
        defined.iter().sum::<f64>() / defined.len() as f64
    };

    let mut hurst = vec![f64::NAN; n];
    let mut fluctuations = vec![f64::NAN; n];

    // Sequential fold: each index reads the previous index's Hurst value.
    let mut prev_hurst = f64::NAN;
    for i in 0..n {
        let fractal_dim = if prev_hurst.is_finite() {
            2.0 - prev_hurst
        } else {
            2.0
        };

        let window = adaptive_window(entropy[i], entropy_mean, fractal_dim, config);

        if i >= window {
            let segment = &closes[i - window..i];
            let fluctuation = detrended_rms(segment);
            fluctuations[i] = fluctuation;
            if fluctuation > 0.0 {
                hurst[i] = fluctuation.ln() / (window as f64).ln();
            }
        }

        prev_hurst = hurst[i];
    }

    trace!(
        len = n,
        last_hurst = format!("{:.4}", hurst.last().copied().unwrap_or(f64::NAN)),
        "adaptive Hurst pass complete"
    );

    FractalSeries {
        hurst,
        fluctuations,
        rolling_volatility,
        entropy,
    }
}

/// Window size for index i. Falls back to the base window whenever the
/// exponent cannot be formed (undefined entropy, zero entropy mean, zero
/// fractal dimension).
fn adaptive_window(
    entropy_i: f64,
    entropy_mean: f64,
    fractal_dim: f64,
    config: &EngineConfig,
) -> usize {
    if !entropy_i.is_finite() || !entropy_mean.is_finite() || entropy_mean.abs() < f64::EPSILON {
        return config.base_window_size;
    }

    let exponent = -config.volatility_entropy_weight * entropy_i / entropy_mean
        + config.fractal_dimension_weight / fractal_dim;
    if !exponent.is_finite() {
        return config.base_window_size;
    }

    let scaled = (config.base_window_size as f64 * exponent.exp()).round();
    scaled.clamp(MIN_WINDOW as f64, MAX_WINDOW as f64) as usize
}

/// Rolling population standard deviation over a trailing window; NaN until
/// `window` samples have accumulated.
fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in window..n {
        let slice = &values[i - window..i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window as f64;
        out[i] = variance.sqrt();
    }
    out
}

/// RMS of the residuals after removing a degree-1 least-squares trend.
fn detrended_rms(segment: &[f64]) -> f64 {
    let n = segment.len() as f64;
    let t_mean = (n - 1.0) / 2.0;
    let y_mean = segment.iter().sum::<f64>() / n;

    let mut numerator = 0.0_f64;
    let mut denominator = 0.0_f64;
    for (t, &y) in segment.iter().enumerate() {
        let dt = t as f64 - t_mean;
        numerator += dt * (y - y_mean);
        denominator += dt * dt;
    }

    // `denominator` is strictly positive for any segment of length >= 2.
    let slope = numerator / denominator;
    let intercept = y_mean - slope * t_mean;

    let sum_sq: f64 = segment
        .iter()
        .enumerate()
        .map(|(t, &y)| {
            let residual = y - (intercept + slope * t as f64);
            residual * residual
        })
        .sum();

    (sum_sq / n).sqrt()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn log_returns(closes: &[f64]) -> Vec<f64> {
        let mut returns = vec![0.0];
        for pair in closes.windows(2) {
            returns.push((pair[1] / pair[0]).ln());
        }
        returns
    }

    /// Rising series with a wobble large enough to leave meaningful
    /// detrending residuals at this price scale.
    fn wobbly_uptrend(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 10_000.0 + 40.0 * i as f64 + 25.0 * (0.9 * i as f64).sin())
            .collect()
    }

    #[test]
    fn output_lengths_match_input() {
        let closes = wobbly_uptrend(80);
        let returns = log_returns(&closes);
        let result = estimate_adaptive_hurst(&closes, &returns, &EngineConfig::default());
        assert_eq!(result.hurst.len(), 80);
        assert_eq!(result.fluctuations.len(), 80);
        assert_eq!(result.rolling_volatility.len(), 80);
        assert_eq!(result.entropy.len(), 80);
    }

    #[test]
    fn rolling_volatility_undefined_until_window_fills() {
        let closes = wobbly_uptrend(80);
        let returns = log_returns(&closes);
        let result = estimate_adaptive_hurst(&closes, &returns, &EngineConfig::default());
        for i in 0..ROLLING_VOL_WINDOW {
            assert!(result.rolling_volatility[i].is_nan(), "index {i}");
        }
        for i in ROLLING_VOL_WINDOW..80 {
            assert!(result.rolling_volatility[i].is_finite(), "index {i}");
        }
    }

    #[test]
    fn hurst_never_defined_before_minimum_window() {
        let closes = wobbly_uptrend(80);
        let returns = log_returns(&closes);
        let result = estimate_adaptive_hurst(&closes, &returns, &EngineConfig::default());
        for i in 0..MIN_WINDOW {
            assert!(result.hurst[i].is_nan(), "index {i}");
        }
    }

    #[test]
    fn hurst_defined_once_history_accumulates() {
        let closes = wobbly_uptrend(80);
        let returns = log_returns(&closes);
        let result = estimate_adaptive_hurst(&closes, &returns, &EngineConfig::default());
        // By the time the maximum possible window has filled, every index
        // with positive fluctuation must carry a real Hurst value.
        assert!(result.hurst[79].is_finite());
        assert!(result.hurst[79] > 0.5, "got {}", result.hurst[79]);
    }

    #[test]
    fn constant_series_yields_no_hurst() {
        // Zero fluctuation at every index: undefined throughout, and the
        // zero entropy mean must not blow up the window computation.
        let closes = vec![250.0; 80];
        let returns = log_returns(&closes);
        let result = estimate_adaptive_hurst(&closes, &returns, &EngineConfig::default());
        assert!(result.hurst.iter().all(|h| h.is_nan()));
        assert!(result.fluctuations[79].abs() < 1e-12);
    }

    #[test]
    fn estimation_is_deterministic() {
        let closes = wobbly_uptrend(100);
        let returns = log_returns(&closes);
        let config = EngineConfig::default();
        let a = estimate_adaptive_hurst(&closes, &returns, &config);
        let b = estimate_adaptive_hurst(&closes, &returns, &config);
        for i in 0..100 {
            let same = (a.hurst[i].is_nan() && b.hurst[i].is_nan()) || a.hurst[i] == b.hurst[i];
            assert!(same, "divergence at index {i}");
        }
    }

    #[test]
    fn detrended_rms_of_exact_line_is_zero() {
        let segment: Vec<f64> = (0..20).map(|t| 5.0 + 3.0 * t as f64).collect();
        assert!(detrended_rms(&segment) < 1e-9);
    }

    #[test]
    fn detrended_rms_of_square_wave() {
        // Alternating +1/-1 around a flat line: RMS of residuals is 1.
        let segment: Vec<f64> = (0..20)
            .map(|t| if t % 2 == 0 { 101.0 } else { 99.0 })
            .collect();
        let rms = detrended_rms(&segment);
        assert!((rms - 1.0).abs() < 0.05, "got {rms}");
    }

    #[test]
    fn adaptive_window_clamps_to_bounds() {
        let config = EngineConfig::default();
        // Strongly negative exponent drives the window to the floor.
        assert_eq!(adaptive_window(10.0, 0.1, 2.0, &config), MIN_WINDOW);
        // Strongly positive exponent saturates at the ceiling.
        assert_eq!(adaptive_window(-10.0, 0.1, 2.0, &config), MAX_WINDOW);
        // Undefined entropy falls back to the base window.
        assert_eq!(
            adaptive_window(f64::NAN, 0.1, 2.0, &config),
            config.base_window_size
        );
        // Zero entropy mean falls back as well.
        assert_eq!(
            adaptive_window(0.5, 0.0, 2.0, &config),
            config.base_window_size
        );
        // Zero fractal dimension produces an infinite term: fall back.
        assert_eq!(
            adaptive_window(0.5, 0.5, 0.0, &config),
            config.base_window_size
        );
    }
}
