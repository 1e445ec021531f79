//! Sliding-window spectral energy.
//!
//! Each window of `W` consecutive log returns is tapered, transformed with a
//! length-`W` forward FFT and reduced to one energy per band:
//! `energy = Σ |X[k]|` for `k` in `[lo, hi)`.
//!
//! Energies are plain sums and are not divided by `W`. Series computed with
//! different window sizes are not directly comparable; rescale them first.

use rayon::prelude::*;
use rustfft::{Fft, FftPlanner, num_complex::Complex};

use crate::bands::SpectrumBand;
use crate::config::AnalysisConfig;
use crate::error::{PipelineError, Result};
use crate::returns::ReturnSeries;

/// Band energies of one window.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralRecord {
    /// Exclusive end of the window in the return series (`i` in `[W, M)`).
    pub offset: usize,
    /// Timestamp of the last return inside the window.
    pub timestamp: u64,
    /// One value per band, in band order.
    pub energies: Vec<f64>,
}

/// Analyzer output, ordered by offset ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralSeries {
    pub window_size: usize,
    pub band_names: Vec<String>,
    pub records: Vec<SpectralRecord>,
}

impl SpectralSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Energy series of a single band, or `None` for an unknown name.
    pub fn energy_series(&self, band: &str) -> Option<Vec<f64>> {
        let idx = self.band_names.iter().position(|name| name == band)?;
        Some(self.records.iter().map(|r| r.energies[idx]).collect())
    }

    pub fn timestamps(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.timestamp).collect()
    }
}

pub struct SlidingSpectralAnalyzer {
    window_size: usize,
    weights: Vec<f64>,
    bands: Vec<SpectrumBand>,
    fft: std::sync::Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for SlidingSpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingSpectralAnalyzer")
            .field("window_size", &self.window_size)
            .field("bands", &self.bands)
            .finish()
    }
}

impl SlidingSpectralAnalyzer {
    /// Validates the configuration and plans the transform.
    ///
    /// # Errors
    /// * `InvalidInput` for a zero window, bad band bounds, disallowed overlap
    ///   or a taper that does not match the window size.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let weights = config.taper.weights(config.window_size)?;
        let fft = FftPlanner::new().plan_fft_forward(config.window_size);
        tracing::debug!(
            "Planned {}-point FFT with {} taper and {} band(s)",
            config.window_size,
            config.taper.name(),
            config.bands.len()
        );
        Ok(Self {
            window_size: config.window_size,
            weights,
            bands: config.bands.bands().to_vec(),
            fft,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Slides the window across `returns` and computes every band energy.
    ///
    /// Produces exactly `returns.len() - W` records. Windows are independent
    /// and are evaluated on the current rayon pool.
    ///
    /// # Errors
    /// * `InvalidInput` if the window is longer than the return series.
    pub fn analyze(&self, returns: &ReturnSeries) -> Result<SpectralSeries> {
        let m = returns.len();
        if self.window_size > m {
            return Err(PipelineError::invalid(format!(
                "window size {} exceeds return series length {}",
                self.window_size, m
            )));
        }
        if returns.timestamps.len() != m {
            return Err(PipelineError::invalid(format!(
                "return series has {} values but {} timestamps",
                m,
                returns.timestamps.len()
            )));
        }

        let records: Vec<SpectralRecord> = (self.window_size..m)
            .into_par_iter()
            .map(|i| {
                let window = &returns.values[i - self.window_size..i];
                SpectralRecord {
                    offset: i,
                    timestamp: returns.timestamps[i - 1],
                    energies: self.band_energies(&self.magnitudes(window)),
                }
            })
            .collect();

        tracing::debug!(
            "Analyzed {} window(s) of {} returns over {} returns",
            records.len(),
            self.window_size,
            m
        );

        Ok(SpectralSeries {
            window_size: self.window_size,
            band_names: self.bands.iter().map(|b| b.name.clone()).collect(),
            records,
        })
    }

    /// Tapers one window and returns `|X[k]|` for all `W` bins.
    ///
    /// # Errors
    /// * `InvalidInput` if `window` does not hold exactly `W` samples.
    pub fn magnitude_spectrum(&self, window: &[f64]) -> Result<Vec<f64>> {
        if window.len() != self.window_size {
            return Err(PipelineError::invalid(format!(
                "window holds {} samples, expected {}",
                window.len(),
                self.window_size
            )));
        }
        Ok(self.magnitudes(window))
    }

    fn magnitudes(&self, window: &[f64]) -> Vec<f64> {
        let mut buffer: Vec<Complex<f64>> = window
            .iter()
            .zip(&self.weights)
            .map(|(&x, &w)| Complex::new(x * w, 0.0))
            .collect();
        let mut scratch = vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()];
        self.fft.process_with_scratch(&mut buffer, &mut scratch);
        buffer.iter().map(|c| c.norm()).collect()
    }

    fn band_energies(&self, magnitudes: &[f64]) -> Vec<f64> {
        self.bands
            .iter()
            .map(|band| magnitudes[band.lo..band.hi].iter().sum())
            .collect()
    }
}
