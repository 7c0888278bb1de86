// =============================================================================
// Particle-Filter Volatility Estimator — sequential Monte Carlo
// =============================================================================
//
// Latent log-volatility state estimated from the return sequence:
//
//   state:       p <- 0.9 * p + t5 * 0.01        (Student-t propagation noise)
//   emission:    r ~ Student-t(df=5, loc=0, scale=sqrt(exp(p/2)))
//   estimate:    mean over particles of exp(p/2)
//
// Weights are updated with the Student-t likelihood and renormalized with an
// epsilon guard. When the effective sample size 1/Σw² drops below half the
// particle count, the particle set is rebuilt by systematic resampling (one
// uniform offset, fixed stride 1/N) and weights reset to uniform.
//
// All randomness flows through the caller-supplied generator, so a seeded
// generator reproduces the estimate sequence exactly.

use std::f64::consts::PI;

use rand::Rng;
use rand_distr::{Distribution, Normal, StudentT};
use statrs::function::gamma::ln_gamma;
use tracing::trace;

/// AR(1) coefficient of the latent state propagation.
const AR_COEFFICIENT: f64 = 0.9;

/// Scale of the Student-t propagation noise.
const NOISE_SCALE: f64 = 0.01;

/// Standard deviation of the zero-mean particle initialization.
const INIT_STD: f64 = 0.01;

/// Degrees of freedom shared by propagation noise and emission likelihood.
const DEGREES_OF_FREEDOM: f64 = 5.0;

/// Guard for weight renormalization and emission scale.
const EPSILON: f64 = 1e-10;

/// The filter needs strictly more than this many defined returns to run.
const MIN_CLEAN_RETURNS: usize = 20;

/// Sequential Monte Carlo volatility estimator.
///
/// The filter itself is stateless between calls: particles and weights live
/// only for the duration of one [`run`](Self::run).
pub struct ParticleFilter {
    particle_count: usize,
    init: Normal<f64>,
    noise: StudentT<f64>,
}

impl ParticleFilter {
    /// `particle_count` is assumed already validated by the engine config.
    pub fn new(particle_count: usize) -> Self {
        // Distribution parameters are fixed constants; construction cannot fail.
        let init = Normal::new(0.0, INIT_STD).unwrap();
        let noise = StudentT::new(DEGREES_OF_FREEDOM).unwrap();
        Self {
            particle_count,
            init,
            noise,
        }
    }

    /// Estimate the latent volatility for each return.
    ///
    /// Undefined (NaN) returns are skipped; the output is front-padded with
    /// NaN so that the estimates align with the tail of the input and the
    /// result has the input's length. Returns an all-NaN vector when fewer
    /// than [`MIN_CLEAN_RETURNS`] + 1 defined returns exist.
    pub fn run<R: Rng + ?Sized>(&self, returns: &[f64], rng: &mut R) -> Vec<f64> {
        let mut output = vec![f64::NAN; returns.len()];

        let clean: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
        if clean.len() <= MIN_CLEAN_RETURNS {
            trace!(
                clean = clean.len(),
                "particle filter skipped: insufficient defined returns"
            );
            return output;
        }

        let count = self.particle_count;
        let count_f = count as f64;

        let mut particles: Vec<f64> = (0..count).map(|_| self.init.sample(rng)).collect();
        let mut weights = vec![1.0 / count_f; count];
        let mut estimates = Vec::with_capacity(clean.len());
        let mut resamples = 0_usize;

        for &r in &clean {
            // Propagate.
            for p in particles.iter_mut() {
                *p = AR_COEFFICIENT * *p + self.noise.sample(rng) * NOISE_SCALE;
            }

            // Weight update with the Student-t emission likelihood.
            for (w, &p) in weights.iter_mut().zip(particles.iter()) {
                let scale = (p / 2.0).exp().sqrt() + EPSILON;
                *w *= student_t_pdf(r, DEGREES_OF_FREEDOM, scale);
            }
            let total: f64 = weights.iter().sum();
            for w in weights.iter_mut() {
                *w /= total + EPSILON;
            }

            // Degeneracy check.
            if effective_sample_size(&weights) < count_f / 2.0 {
                let offset = rng.gen_range(0.0..1.0 / count_f);
                let indices = systematic_resample(&weights, offset);
                let resampled: Vec<f64> = indices.iter().map(|&idx| particles[idx]).collect();
                particles = resampled;
                weights.iter_mut().for_each(|w| *w = 1.0 / count_f);
                resamples += 1;
            }

            let estimate = particles.iter().map(|p| (p / 2.0).exp()).sum::<f64>() / count_f;
            estimates.push(estimate);
        }

        trace!(
            steps = estimates.len(),
            resamples,
            particles = count,
            "particle filter pass complete"
        );

        let start = output.len() - estimates.len();
        output[start..].copy_from_slice(&estimates);
        output
    }
}

/// Effective sample size of a normalized weight vector: 1 / Σw².
pub fn effective_sample_size(weights: &[f64]) -> f64 {
    let sum_sq: f64 = weights.iter().map(|w| w * w).sum();
    1.0 / (sum_sq + EPSILON)
}

/// Systematic resampling: a single uniform `offset` in [0, 1/N) and a fixed
/// stride of 1/N walk the cumulative-weight staircase, selecting N indices.
///
/// Deterministic given the weight vector and the offset.
pub fn systematic_resample(weights: &[f64], offset: f64) -> Vec<usize> {
    let n = weights.len();
    let mut cumulative = Vec::with_capacity(n);
    let mut running = 0.0_f64;
    for &w in weights {
        running += w;
        cumulative.push(running);
    }

    let step = 1.0 / n as f64;
    let mut u = offset;
    let mut indices = vec![0_usize; n];
    let mut i = 0_usize;

    for slot in indices.iter_mut() {
        while u > cumulative[i] && i < n - 1 {
            i += 1;
        }
        *slot = i;
        u += step;
    }

    indices
}

/// Student-t density with location 0 and the given scale.
fn student_t_pdf(x: f64, df: f64, scale: f64) -> f64 {
    let z = x / scale;
    let log_coef =
        ln_gamma((df + 1.0) / 2.0) - ln_gamma(df / 2.0) - 0.5 * (df * PI).ln() - scale.ln();
    let log_kernel = -((df + 1.0) / 2.0) * (1.0 + z * z / df).ln();
    (log_coef + log_kernel).exp()
}
