// =============================================================================
// Trend-Conditioned Hurst Splitter — asymmetric MA-DFA
// =============================================================================
//
// Partitions the Hurst series into an up-trend and a down-trend component by
// classifying the trailing 10 returns at each index:
//
//   > 60% positive  =>  uptrend:   hurst_up[i] = hurst[i]
//   < 40% positive  =>  downtrend: hurst_down[i] = hurst[i]
//   otherwise       =>  neutral:   both undefined
//
// Indices before `base_window` or without a defined Hurst value stay
// undefined on both sides.

/// Returns examined when classifying the local trend.
const TREND_LOOKBACK: usize = 10;

const UPTREND_FRACTION: f64 = 0.6;
const DOWNTREND_FRACTION: f64 = 0.4;

/// Up/down partition of a Hurst series. NaN marks undefined entries; at any
/// index at most one side is defined.
#[derive(Debug, Clone)]
pub struct TrendSplit {
    pub hurst_up: Vec<f64>,
    pub hurst_down: Vec<f64>,
}

pub fn split_by_trend(hurst: &[f64], log_returns: &[f64], base_window: usize) -> TrendSplit {
    let n = hurst.len();
    let mut hurst_up = vec![f64::NAN; n];
    let mut hurst_down = vec![f64::NAN; n];

    for i in 0..n {
        if i < base_window || !hurst[i].is_finite() {
            continue;
        }

        let recent = &log_returns[i.saturating_sub(TREND_LOOKBACK)..i];
        if recent.is_empty() {
            continue;
        }

        let positive = recent.iter().filter(|&&r| r > 0.0).count() as f64;
        let len = recent.len() as f64;

        if positive > len * UPTREND_FRACTION {
            hurst_up[i] = hurst[i];
        } else if positive < len * DOWNTREND_FRACTION {
            hurst_down[i] = hurst[i];
        }
        // Neutral zone: both stay undefined.
    }

    TrendSplit {
        hurst_up,
        hurst_down,
    }
}
