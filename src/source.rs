use crate::config::{Interval, Period};
use crate::error::{PipelineError, Result};
use crate::resample;
use crate::returns::PricePoint;
use crate::utils;

/// Provider of ordered price series.
///
/// Implementations report every failure as `DataUnavailable`; the pipeline
/// neither retries nor caches on their behalf.
pub trait DataSource: Send + Sync {
    fn fetch_series(&self, symbol: &str, period: Period, interval: Interval) -> Result<Vec<PricePoint>>;
}

/// Represents a single record from input CSV.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CsvRecord {
    #[serde(rename = "<DATE>")]
    date: String,
    #[serde(rename = "<TIME>")]
    time: String,
    #[serde(rename = "<OPEN>")]
    open: f64,
    #[serde(rename = "<HIGH>")]
    high: f64,
    #[serde(rename = "<LOW>")]
    low: f64,
    #[serde(rename = "<CLOSE>")]
    close: f64,
    #[serde(rename = "<VOL>")]
    vol: u64,
}

/// Reads `<SYMBOL>.csv` exports from a directory.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    dir: std::path::PathBuf,
}

impl CsvDataSource {
    pub fn new<P: AsRef<std::path::Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path_for(&self, symbol: &str) -> std::path::PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }
}

impl DataSource for CsvDataSource {
    /// Loads closes for `symbol`, resamples them to `interval` and keeps the
    /// trailing `period`.
    ///
    /// # Errors
    /// * `DataUnavailable` if the file is missing, a row fails to parse, rows
    ///   are not in strictly increasing time order or nothing is left after
    ///   filtering.
    fn fetch_series(&self, symbol: &str, period: Period, interval: Interval) -> Result<Vec<PricePoint>> {
        let path = self.path_for(symbol);
        let file = std::fs::File::open(&path)
            .map_err(|e| PipelineError::unavailable(format!("{}: cannot open {}: {}", symbol, path.display(), e)))?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

        let closes = read_closes(&mut reader)
            .map_err(|e| PipelineError::unavailable(format!("{}: {}", symbol, e)))?;
        tracing::debug!("Read {} rows for {} from {}", closes.len(), symbol, path.display());

        let resampled = resample::resample_closes(&closes, interval);
        let series = trailing_period(resampled, period);
        if series.is_empty() {
            return Err(PipelineError::unavailable(format!("{}: no data in {}", symbol, path.display())));
        }
        tracing::info!("Loaded {} {} bars for {}", series.len(), interval, symbol);
        Ok(series)
    }
}

/// Reads closing prices from an export reader, in file order.
///
/// # Errors
/// * If CSV deserialization or datetime parsing fails.
/// * If a row is not strictly later than the row before it.
fn read_closes<R: std::io::Read>(reader: &mut csv::Reader<R>) -> anyhow::Result<Vec<PricePoint>> {
    let mut closes: Vec<PricePoint> = Vec::new();
    for (row, result) in reader.deserialize::<CsvRecord>().enumerate() {
        let record: CsvRecord = result?;
        let timestamp = utils::parse_export_datetime(&record.date, &record.time)?;
        if let Some(prev) = closes.last() {
            if timestamp <= prev.timestamp {
                anyhow::bail!(
                    "row {} ({} {}) is not after the previous row ({})",
                    row + 1,
                    record.date,
                    record.time,
                    prev.timestamp
                );
            }
        }
        closes.push(PricePoint::new(timestamp, record.close));
    }
    anyhow::Ok(closes)
}

/// Keeps the points no older than `period` before the last point.
fn trailing_period(series: Vec<PricePoint>, period: Period) -> Vec<PricePoint> {
    match (period, series.last()) {
        (Period::Span(span), Some(last)) => {
            let cutoff = last.timestamp.saturating_sub(span);
            series.into_iter().filter(|p| p.timestamp >= cutoff).collect()
        }
        _ => series,
    }
}
