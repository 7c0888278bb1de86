// =============================================================================
// Realized Semivariance — signed dispersion over a short trailing window
// =============================================================================
//
// Over the trailing 5 returns:
//
//   upside[i]   = sum of squared positive returns in the window
//   downside[i] = sum of squared negative returns in the window
//
// Both sides are zero (not undefined) until the window fills. Independent of
// the particle filter; used by the aggregator to compare upside versus
// downside pressure.

/// Trailing window length.
const WINDOW: usize = 5;

/// Upside/downside realized semivariance series, equal in length to the
/// input returns.
#[derive(Debug, Clone)]
pub struct Semivariance {
    pub upside: Vec<f64>,
    pub downside: Vec<f64>,
}

pub fn realized_semivariance(log_returns: &[f64]) -> Semivariance {
    let n = log_returns.len();
    let mut upside = vec![0.0; n];
    let mut downside = vec![0.0; n];

    for i in WINDOW..n {
        let window = &log_returns[i - WINDOW..i];
        let mut up = 0.0_f64;
        let mut down = 0.0_f64;
        for &r in window {
            if r > 0.0 {
                up += r * r;
            } else if r < 0.0 {
                down += r * r;
            }
        }
        upside[i] = up;
        downside[i] = down;
    }

    Semivariance { upside, downside }
}
