// =============================================================================
// Volatility Estimation Module
// =============================================================================
//
// Latent-volatility and dispersion measures for the signal pipeline:
// - Sequential Monte Carlo (particle filter) volatility estimation
// - Realized semivariance (upside / downside)
// - Whole-series volatility and its entropy

pub mod particle_filter;
pub mod semivariance;

pub use particle_filter::{effective_sample_size, systematic_resample, ParticleFilter};
pub use semivariance::{realized_semivariance, Semivariance};

/// Volatility assumed when a series carries no information at all.
pub const DEFAULT_VOLATILITY: f64 = 0.02;

/// Guard added inside entropy logarithms.
pub const ENTROPY_EPSILON: f64 = 1e-10;

/// Population standard deviation of the full return series.
pub fn global_volatility(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return DEFAULT_VOLATILITY;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Entropy of the whole-series volatility: -v * ln(v + eps).
pub fn volatility_entropy(returns: &[f64]) -> f64 {
    let vol = global_volatility(returns);
    -vol * (vol + ENTROPY_EPSILON).ln()
}
