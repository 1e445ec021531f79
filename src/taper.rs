use crate::error::{PipelineError, Result};

/// Weighting applied to each window before the transform.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Taper {
    /// Symmetric raised cosine: zero at both ends, peak at the centre.
    #[default]
    Hann,
    /// All ones. Leaves edge discontinuities in place.
    Rectangular,
    /// Caller supplied weights; length must equal the window size.
    Custom(Vec<f64>),
}

impl Taper {
    /// Materialises the weights for a window of `len` samples.
    ///
    /// # Errors
    /// * `InvalidInput` if `len` is zero, or custom weights have the wrong
    ///   length or contain non-finite values.
    pub fn weights(&self, len: usize) -> Result<Vec<f64>> {
        if len == 0 {
            return Err(PipelineError::invalid("taper length must be positive"));
        }
        match self {
            Taper::Hann => Ok(hann(len)),
            Taper::Rectangular => Ok(vec![1.0; len]),
            Taper::Custom(weights) => {
                if weights.len() != len {
                    return Err(PipelineError::invalid(format!(
                        "custom taper has {} weights, window size is {}",
                        weights.len(),
                        len
                    )));
                }
                if weights.iter().any(|w| !w.is_finite()) {
                    return Err(PipelineError::invalid("custom taper weights must be finite"));
                }
                Ok(weights.clone())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Taper::Hann => "hann",
            Taper::Rectangular => "rectangular",
            Taper::Custom(_) => "custom",
        }
    }
}

impl std::str::FromStr for Taper {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hann" | "hanning" => Ok(Taper::Hann),
            "rectangular" | "rect" | "none" => Ok(Taper::Rectangular),
            other => Err(PipelineError::invalid(format!("unknown taper '{}'", other))),
        }
    }
}

/// `w[n] = 0.5 - 0.5 cos(2πn / (len - 1))`; a single-sample window is `[1.0]`.
fn hann(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / denom).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hann_shape() {
        for len in [2, 5, 30, 48, 64] {
            let w = Taper::Hann.weights(len).unwrap();
            assert_eq!(w.len(), len);
            assert_relative_eq!(w[0], 0.0, epsilon = 1e-15);
            assert_relative_eq!(w[len - 1], 0.0, epsilon = 1e-15);
            for i in 0..len {
                assert_relative_eq!(w[i], w[len - 1 - i], epsilon = 1e-12);
            }
            let peak = w.iter().cloned().fold(f64::MIN, f64::max);
            assert!(peak <= 1.0 + 1e-12);
        }
        let odd = Taper::Hann.weights(5).unwrap();
        assert_relative_eq!(odd[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_sample_window() {
        assert_eq!(Taper::Hann.weights(1).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_custom_length_mismatch() {
        let taper = Taper::Custom(vec![1.0, 0.5]);
        assert!(matches!(taper.weights(3), Err(PipelineError::InvalidInput(_))));
        assert_eq!(taper.weights(2).unwrap(), vec![1.0, 0.5]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("HANN".parse::<Taper>().unwrap(), Taper::Hann);
        assert_eq!("rectangular".parse::<Taper>().unwrap(), Taper::Rectangular);
        assert!("kaiser".parse::<Taper>().is_err());
    }
}
