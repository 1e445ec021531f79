use crate::analyzer::SpectralSeries;
use crate::error::{PipelineError, Result};
use crate::returns::PricePoint;

/// The return series is one sample shorter than the price series it came from.
pub const RETURN_OFFSET: usize = 1;

/// Parallel series ready for a rendering sink.
///
/// Row `k` holds the window tag of analyzer record `k`, the price at index
/// `k + W + 1` and one energy per band.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedOutput {
    pub window_size: usize,
    pub timestamps: Vec<u64>,
    pub prices: Vec<f64>,
    pub band_names: Vec<String>,
    /// `energies[b][k]` is the energy of band `b` in row `k`.
    pub energies: Vec<Vec<f64>>,
}

impl AlignedOutput {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn band(&self, name: &str) -> Option<&[f64]> {
        let idx = self.band_names.iter().position(|n| n == name)?;
        Some(&self.energies[idx])
    }
}

/// Index of the price that row `k` of the analyzer output is aligned to.
pub fn price_index(k: usize, window_size: usize) -> usize {
    k + window_size + RETURN_OFFSET
}

/// Maps analyzer records back onto the price series they were derived from.
///
/// # Arguments
/// * `prices` - The price series the returns were built from.
/// * `spectral` - Analyzer output for those returns.
///
/// # Returns
/// * `Result<AlignedOutput>` - One row per analyzer record.
///
/// # Errors
/// * `AlignmentError` if `prices.len() - 1 - W` differs from the number of
///   records, or a record's offset or timestamp does not sit where the index
///   contract puts it.
pub fn align(prices: &[PricePoint], spectral: &SpectralSeries) -> Result<AlignedOutput> {
    let w = spectral.window_size;
    let expected = prices.len().checked_sub(RETURN_OFFSET + w).ok_or_else(|| {
        PipelineError::AlignmentError {
            expected: w + RETURN_OFFSET,
            actual: prices.len(),
            detail: format!("price series shorter than window {} plus return offset", w),
        }
    })?;
    if expected != spectral.len() {
        return Err(PipelineError::AlignmentError {
            expected,
            actual: spectral.len(),
            detail: format!(
                "{} prices with window {} leave {} rows, analyzer produced {}",
                prices.len(),
                w,
                expected,
                spectral.len()
            ),
        });
    }

    let mut timestamps = Vec::with_capacity(expected);
    let mut aligned_prices = Vec::with_capacity(expected);
    let mut energies = vec![Vec::with_capacity(expected); spectral.band_names.len()];

    for (k, record) in spectral.records.iter().enumerate() {
        if record.offset != k + w {
            return Err(PipelineError::AlignmentError {
                expected: k + w,
                actual: record.offset,
                detail: format!("record {} has an out-of-sequence offset", k),
            });
        }
        let tag = prices[record.offset].timestamp;
        if record.timestamp != tag {
            return Err(PipelineError::AlignmentError {
                expected: tag as usize,
                actual: record.timestamp as usize,
                detail: format!(
                    "record {} is tagged {} but price {} is at {}",
                    k, record.timestamp, record.offset, tag
                ),
            });
        }
        if record.energies.len() != energies.len() {
            return Err(PipelineError::AlignmentError {
                expected: energies.len(),
                actual: record.energies.len(),
                detail: format!("record {} has the wrong number of band energies", k),
            });
        }

        timestamps.push(record.timestamp);
        aligned_prices.push(prices[price_index(k, w)].price);
        for (column, &value) in energies.iter_mut().zip(&record.energies) {
            column.push(value);
        }
    }

    tracing::debug!("Aligned {} rows against {} prices", timestamps.len(), prices.len());
    Ok(AlignedOutput {
        window_size: w,
        timestamps,
        prices: aligned_prices,
        band_names: spectral.band_names.clone(),
        energies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::SlidingSpectralAnalyzer;
    use crate::bands::{BandSet, SpectrumBand};
    use crate::config::AnalysisConfig;
    use crate::returns::build_returns;

    fn prices(n: usize) -> Vec<PricePoint> {
        (0..n)
            .map(|i| PricePoint::new(1_600_000_000 + i as u64 * 3600, 100.0 + ((i * 13) % 7) as f64))
            .collect()
    }

    fn analyze(prices: &[PricePoint], window: usize) -> SpectralSeries {
        let returns = build_returns(prices).unwrap();
        let bands = BandSet::new(vec![
            SpectrumBand::new("retail", 1, 5),
            SpectrumBand::new("whale", 10, 20),
        ]);
        SlidingSpectralAnalyzer::new(&AnalysisConfig::new(window, bands))
            .unwrap()
            .analyze(&returns)
            .unwrap()
    }

    #[test]
    fn test_aligns_hundred_prices() {
        let prices = prices(100);
        let spectral = analyze(&prices, 48);
        assert_eq!(spectral.len(), 51);

        let aligned = align(&prices, &spectral).unwrap();
        assert_eq!(aligned.len(), 51);
        assert_eq!(aligned.prices.len(), 51);
        assert_eq!(aligned.energies.len(), 2);
        assert!(aligned.energies.iter().all(|e| e.len() == 51));
        assert_eq!(aligned.prices[0], prices[49].price);
        assert_eq!(*aligned.prices.last().unwrap(), prices[99].price);
        assert_eq!(aligned.timestamps[0], prices[48].timestamp);
        assert_eq!(aligned.band("whale").unwrap(), spectral.energy_series("whale").unwrap().as_slice());
    }

    #[test]
    fn test_rejects_shorter_price_series() {
        let prices = prices(100);
        let spectral = analyze(&prices, 48);
        let err = align(&prices[..99], &spectral).unwrap_err();
        assert!(matches!(err, PipelineError::AlignmentError { expected: 50, actual: 51, .. }));
    }

    #[test]
    fn test_rejects_price_series_shorter_than_window() {
        let spectral = analyze(&prices(100), 48);
        assert!(matches!(
            align(&prices(20), &spectral),
            Err(PipelineError::AlignmentError { .. })
        ));
    }

    #[test]
    fn test_rejects_shifted_timestamps() {
        let original = prices(60);
        let spectral = analyze(&original, 40);
        let shifted: Vec<PricePoint> = original
            .iter()
            .map(|p| PricePoint::new(p.timestamp + 1, p.price))
            .collect();
        assert!(matches!(
            align(&shifted, &spectral),
            Err(PipelineError::AlignmentError { .. })
        ));
    }

    #[test]
    fn test_price_index_formula() {
        assert_eq!(price_index(0, 48), 49);
        assert_eq!(price_index(50, 48), 99);
    }
}
