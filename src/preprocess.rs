// =============================================================================
// Preprocessor — gap repair and log-return computation
// =============================================================================
//
// Upstream feeds occasionally deliver bars with missing fields (NaN). Interior
// gaps are repaired per field by forward-fill then backward-fill, the same
// order the rest of the pipeline assumes: a value at index i never depends on
// data after i except through the backward-fill of a leading gap.
//
// log_return[i] = ln(close[i] / close[i-1]) for i > 0, log_return[0] = 0.

use tracing::trace;

use crate::error::EngineError;
use crate::types::PriceSeries;

/// Cleaned per-field arrays plus log returns, all equal in length to the
/// input series.
#[derive(Debug, Clone)]
pub struct ProcessedSeries {
    pub opens: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
    pub volumes: Vec<f64>,
    pub log_returns: Vec<f64>,
}

/// Run the full preprocessing pass over a validated series.
///
/// Fails when a field is undefined across the entire series (nothing to fill
/// from) or when a repaired close is still non-positive.
pub fn preprocess(series: &PriceSeries) -> Result<ProcessedSeries, EngineError> {
    let mut opens = series.opens();
    let mut highs = series.highs();
    let mut lows = series.lows();
    let mut closes = series.closes();
    let mut volumes = series.volumes();

    for (name, field) in [
        ("open", &mut opens),
        ("high", &mut highs),
        ("low", &mut lows),
        ("close", &mut closes),
        ("volume", &mut volumes),
    ] {
        let filled = fill_gaps(field);
        if filled > 0 {
            trace!(field = name, filled, "repaired undefined values");
        }
        if field.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidSeries {
                reason: format!("field '{name}' has no defined values"),
            });
        }
    }

    if let Some(pos) = closes.iter().position(|&c| c <= 0.0) {
        return Err(EngineError::InvalidSeries {
            reason: format!("non-positive close {} at index {pos}", closes[pos]),
        });
    }

    let log_returns = log_returns(&closes);

    Ok(ProcessedSeries {
        opens,
        highs,
        lows,
        closes,
        volumes,
        log_returns,
    })
}

/// Forward-fill then backward-fill NaN entries in place. Returns the number
/// of entries repaired. A fully-NaN slice is left untouched.
fn fill_gaps(values: &mut [f64]) -> usize {
    let mut filled = 0;

    let mut last_defined: Option<f64> = None;
    for v in values.iter_mut() {
        if v.is_finite() {
            last_defined = Some(*v);
        } else if let Some(prev) = last_defined {
            *v = prev;
            filled += 1;
        }
    }

    // Leading gap: fill backwards from the first defined value.
    let mut next_defined: Option<f64> = None;
    for v in values.iter_mut().rev() {
        if v.is_finite() {
            next_defined = Some(*v);
        } else if let Some(next) = next_defined {
            *v = next;
            filled += 1;
        }
    }

    filled
}

/// Log returns of a positive close series; index 0 is pinned to zero.
fn log_returns(closes: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(closes.len());
    returns.push(0.0);
    for pair in closes.windows(2) {
        returns.push((pair[1] / pair[0]).ln());
    }
    returns
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceBar;

    fn series_with_closes(closes: &[f64]) -> PriceSeries {
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                timestamp: i as i64 * 60_000,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect();
        PriceSeries::try_new(bars).unwrap()
    }

    #[test]
    fn lengths_match_input() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let processed = preprocess(&series_with_closes(&closes)).unwrap();
        assert_eq!(processed.closes.len(), 60);
        assert_eq!(processed.log_returns.len(), 60);
    }

    #[test]
    fn first_log_return_is_zero() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let processed = preprocess(&series_with_closes(&closes)).unwrap();
        assert!((processed.log_returns[0] - 0.0).abs() < f64::EPSILON);
        // ln(101/100)
        let expected = (101.0_f64 / 100.0).ln();
        assert!((processed.log_returns[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn interior_gap_forward_filled() {
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        closes[30] = f64::NAN;
        let processed = preprocess(&series_with_closes(&closes)).unwrap();
        // Forward fill carries index 29's value.
        assert!((processed.closes[30] - 129.0).abs() < 1e-12);
        // The repaired value yields a zero return followed by a double step.
        assert!((processed.log_returns[30] - 0.0).abs() < 1e-12);
        assert!(processed.log_returns[31] > 0.0);
    }

    #[test]
    fn leading_gap_backward_filled() {
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        closes[0] = f64::NAN;
        closes[1] = f64::NAN;
        let processed = preprocess(&series_with_closes(&closes)).unwrap();
        assert!((processed.closes[0] - 102.0).abs() < 1e-12);
        assert!((processed.closes[1] - 102.0).abs() < 1e-12);
    }

    #[test]
    fn fully_undefined_field_is_an_error() {
        let closes: Vec<f64> = vec![f64::NAN; 60];
        let err = preprocess(&series_with_closes(&closes)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSeries { .. }));
    }

    #[test]
    fn constant_series_yields_zero_returns() {
        let closes = vec![100.0; 60];
        let processed = preprocess(&series_with_closes(&closes)).unwrap();
        assert!(processed.log_returns.iter().all(|r| r.abs() < 1e-12));
    }
}
