use crate::error::{PipelineError, Result};

/// A single observed close.
///
/// `timestamp` is in Unix seconds, the same unit the CSV reader produces.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PricePoint {
    pub timestamp: u64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: u64, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Log returns derived from a price series.
///
/// `timestamps[j]` is the timestamp of the price that closes return `j`,
/// i.e. `prices[j + 1].timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub values: Vec<f64>,
    pub timestamps: Vec<u64>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Converts an ordered price sequence into log returns.
///
/// `return[j] = ln(price[j + 1]) - ln(price[j])`, so the output is one sample
/// shorter than the input.
///
/// # Arguments
/// * `prices` - Ordered price points, at least two.
///
/// # Returns
/// * `Result<ReturnSeries>` - Log returns of length `prices.len() - 1`.
///
/// # Errors
/// * `InvalidInput` if fewer than two prices are given, a price is not a
///   positive finite number, or timestamps are not strictly increasing.
pub fn build_returns(prices: &[PricePoint]) -> Result<ReturnSeries> {
    if prices.len() < 2 {
        return Err(PipelineError::invalid(format!(
            "at least 2 prices are required, got {}",
            prices.len()
        )));
    }

    for (i, point) in prices.iter().enumerate() {
        if !point.price.is_finite() || point.price <= 0.0 {
            return Err(PipelineError::invalid(format!(
                "price at index {} must be positive, got {}",
                i, point.price
            )));
        }
    }

    let mut values = Vec::with_capacity(prices.len() - 1);
    let mut timestamps = Vec::with_capacity(prices.len() - 1);
    for (j, pair) in prices.windows(2).enumerate() {
        let (prev, next) = (pair[0], pair[1]);
        if next.timestamp <= prev.timestamp {
            return Err(PipelineError::invalid(format!(
                "timestamps must be strictly increasing: index {} ({}) follows {}",
                j + 1,
                next.timestamp,
                prev.timestamp
            )));
        }
        values.push(next.price.ln() - prev.price.ln());
        timestamps.push(next.timestamp);
    }

    tracing::debug!("Built {} log returns from {} prices", values.len(), prices.len());
    Ok(ReturnSeries { values, timestamps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(1_700_000_000 + i as u64 * 3600, p))
            .collect()
    }

    #[test]
    fn test_length_is_one_shorter() {
        let prices = series(&[100.0, 101.0, 99.5, 102.25, 103.0]);
        let returns = build_returns(&prices).unwrap();
        assert_eq!(returns.len(), prices.len() - 1);
        assert_eq!(returns.timestamps.len(), returns.values.len());
        assert_eq!(returns.timestamps[0], prices[1].timestamp);
        assert_eq!(*returns.timestamps.last().unwrap(), prices[4].timestamp);
    }

    #[test]
    fn test_cumulative_sum_reconstructs_ratios() {
        let prices = series(&[50.0, 52.5, 51.0, 49.75, 60.0, 58.2, 58.2, 61.9]);
        let returns = build_returns(&prices).unwrap();

        let mut acc = 0.0;
        for (j, r) in returns.values.iter().enumerate() {
            acc += r;
            assert_relative_eq!(acc.exp(), prices[j + 1].price / prices[0].price, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let prices = series(&[10.0, 0.0, 11.0]);
        assert!(matches!(build_returns(&prices), Err(PipelineError::InvalidInput(_))));

        let prices = series(&[10.0, -1.0]);
        assert!(matches!(build_returns(&prices), Err(PipelineError::InvalidInput(_))));

        let prices = series(&[10.0, f64::NAN]);
        assert!(matches!(build_returns(&prices), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_short_series() {
        assert!(matches!(build_returns(&[]), Err(PipelineError::InvalidInput(_))));
        let one = series(&[10.0]);
        assert!(matches!(build_returns(&one), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_unordered_timestamps() {
        let prices = vec![
            PricePoint::new(100, 1.0),
            PricePoint::new(200, 1.1),
            PricePoint::new(200, 1.2),
        ];
        assert!(matches!(build_returns(&prices), Err(PipelineError::InvalidInput(_))));

        let prices = vec![PricePoint::new(300, 1.0), PricePoint::new(200, 1.1)];
        assert!(matches!(build_returns(&prices), Err(PipelineError::InvalidInput(_))));
    }
}
