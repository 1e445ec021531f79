use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::error::{PipelineError, Result};

/// Gaussian jitter for an "observed" overlay of a computed series.
///
/// Never part of the analysis itself. With a seed the overlay is reproducible;
/// without one each call draws from fresh entropy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseOverlay {
    sigma: f64,
    seed: Option<u64>,
}

impl NoiseOverlay {
    /// # Errors
    /// * `InvalidInput` if `sigma` is negative or not finite.
    pub fn new(sigma: f64, seed: Option<u64>) -> Result<Self> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(PipelineError::invalid(format!(
                "noise sigma must be a non-negative number, got {}",
                sigma
            )));
        }
        Ok(Self { sigma, seed })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns `series` with `N(0, sigma²)` added to every element.
    pub fn apply(&self, series: &[f64]) -> Result<Vec<f64>> {
        let mut noisy = self.apply_all(std::slice::from_ref(&series))?;
        Ok(noisy.pop().unwrap_or_default())
    }

    /// Jitters several series from one random stream, in order.
    ///
    /// Each series gets its own draws, so parallel columns never share the
    /// same noise. With a seed the whole batch is reproducible.
    pub fn apply_all<S: AsRef<[f64]>>(&self, series: &[S]) -> Result<Vec<Vec<f64>>> {
        let normal = Normal::new(0.0, self.sigma)
            .map_err(|e| PipelineError::invalid(format!("noise distribution: {}", e)))?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(series
            .iter()
            .map(|s| s.as_ref().iter().map(|x| x + normal.sample(&mut rng)).collect())
            .collect())
    }
}
