// =============================================================================
// Fractal Estimation Module
// =============================================================================
//
// Moving-window detrended fluctuation analysis with an entropy/fractal
// adaptive window:
// - Adaptive Hurst estimation (recursive, strictly sequential)
// - Trend-conditioned splitting of the Hurst series into up/down components

pub mod asymmetric;
pub mod ma_dfa;

pub use asymmetric::{split_by_trend, TrendSplit};
pub use ma_dfa::{estimate_adaptive_hurst, FractalSeries};
