use crate::error::{PipelineError, Result};

/// Mean and population standard deviation of one energy series.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BandStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl BandStats {
    /// # Errors
    /// * `InvalidInput` if `series` is empty.
    pub fn from_series(series: &[f64]) -> Result<Self> {
        if series.is_empty() {
            return Err(PipelineError::invalid("cannot compute statistics of an empty series"));
        }
        let n = series.len() as f64;
        let mean = series.iter().sum::<f64>() / n;
        let variance = series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Ok(Self { mean, std_dev: variance.sqrt() })
    }

    /// `mean + k * std_dev`.
    pub fn threshold(&self, k: f64) -> f64 {
        self.mean + k * self.std_dev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_THRESHOLD_MULTIPLIER;
    use approx::assert_relative_eq;

    #[test]
    fn test_threshold_example() {
        let stats = BandStats::from_series(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_relative_eq!(stats.mean, 3.0);
        assert_relative_eq!(stats.std_dev, 2f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            stats.threshold(DEFAULT_THRESHOLD_MULTIPLIER),
            3.0 + 1.5 * 2f64.sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(stats.threshold(1.5), 5.1213, epsilon = 1e-4);
    }

    #[test]
    fn test_constant_series() {
        let stats = BandStats::from_series(&[4.2; 10]).unwrap();
        assert_relative_eq!(stats.std_dev, 0.0, epsilon = 1e-12);
        assert_relative_eq!(stats.threshold(3.0), 4.2, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_series() {
        assert!(matches!(BandStats::from_series(&[]), Err(PipelineError::InvalidInput(_))));
    }
}
