use crate::alignment::AlignedOutput;
use crate::error::{PipelineError, Result};
use crate::stats::BandStats;
use crate::utils;

const PALETTE: [&str; 6] = ["cyan", "magenta", "yellow", "lime", "orange", "white"];

/// Display label and colour of one band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandStyle {
    pub label: String,
    pub color: String,
}

impl BandStyle {
    /// Style for a band name, falling back to a palette slot.
    pub fn for_band(name: &str, slot: usize) -> Self {
        let (label, color) = match name {
            "total" => ("Spectral Energy (Accumulated Charge)".to_string(), "cyan"),
            "retail" => ("Retail Energy (Low Freq)".to_string(), "cyan"),
            "whale" => ("Whale Energy (High Freq)".to_string(), "magenta"),
            other => (format!("{} energy", other), PALETTE[slot % PALETTE.len()]),
        };
        Self { label, color: color.to_string() }
    }
}

/// Threshold line for one band.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Threshold {
    pub band: String,
    pub mean: f64,
    pub std_dev: f64,
    pub multiplier: f64,
    pub value: f64,
}

impl Threshold {
    pub fn new(band: impl Into<String>, stats: BandStats, multiplier: f64) -> Self {
        Self {
            band: band.into(),
            mean: stats.mean,
            std_dev: stats.std_dev,
            multiplier,
            value: stats.threshold(multiplier),
        }
    }
}

/// Extra named column drawn next to the computed series, e.g. a noise overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub name: String,
    pub values: Vec<f64>,
}

/// Everything a sink needs besides the numbers themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderMeta {
    pub symbol: String,
    /// One style per band, in band order.
    pub styles: Vec<BandStyle>,
    /// One threshold per band, in band order.
    pub thresholds: Vec<Threshold>,
    pub overlays: Vec<Overlay>,
}

/// Consumer of aligned output. The pipeline never depends on it succeeding.
pub trait RenderSink {
    fn render(&self, output: &AlignedOutput, meta: &RenderMeta) -> Result<()>;
}

/// Writes `<SYMBOL>_spectral.csv` and `<SYMBOL>_thresholds.csv`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: std::path::PathBuf,
}

#[derive(Debug, serde::Serialize)]
struct ThresholdRow<'a> {
    band: &'a str,
    mean: f64,
    std_dev: f64,
    multiplier: f64,
    threshold: f64,
    label: &'a str,
    color: &'a str,
}

impl CsvSink {
    pub fn new<P: AsRef<std::path::Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn series_path(&self, symbol: &str) -> std::path::PathBuf {
        self.dir.join(format!("{}_spectral.csv", symbol))
    }

    pub fn thresholds_path(&self, symbol: &str) -> std::path::PathBuf {
        self.dir.join(format!("{}_thresholds.csv", symbol))
    }

    fn write_series(&self, output: &AlignedOutput, meta: &RenderMeta) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(self.series_path(&meta.symbol))?;

        let mut header = vec!["timestamp".to_string(), "datetime".to_string(), "price".to_string()];
        header.extend(output.band_names.iter().cloned());
        header.extend(meta.overlays.iter().map(|o| o.name.clone()));
        writer.write_record(&header)?;

        for k in 0..output.len() {
            let mut row = vec![
                output.timestamps[k].to_string(),
                utils::format_timestamp(output.timestamps[k])?,
                output.prices[k].to_string(),
            ];
            row.extend(output.energies.iter().map(|band| band[k].to_string()));
            row.extend(meta.overlays.iter().map(|o| o.values[k].to_string()));
            writer.write_record(&row)?;
        }
        writer.flush()?;
        anyhow::Ok(())
    }

    fn write_thresholds(&self, meta: &RenderMeta) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(self.thresholds_path(&meta.symbol))?;
        for (threshold, style) in meta.thresholds.iter().zip(&meta.styles) {
            writer.serialize(ThresholdRow {
                band: &threshold.band,
                mean: threshold.mean,
                std_dev: threshold.std_dev,
                multiplier: threshold.multiplier,
                threshold: threshold.value,
                label: &style.label,
                color: &style.color,
            })?;
        }
        writer.flush()?;
        anyhow::Ok(())
    }
}

impl RenderSink for CsvSink {
    fn render(&self, output: &AlignedOutput, meta: &RenderMeta) -> Result<()> {
        check_meta(output, meta)?;
        self.write_series(output, meta)
            .and_then(|_| self.write_thresholds(meta))
            .map_err(|e| PipelineError::RenderFailed(format!("{}: {}", meta.symbol, e)))?;
        tracing::info!("Wrote {} rows to {}", output.len(), self.series_path(&meta.symbol).display());
        Ok(())
    }
}

/// Prints the first `rows` aligned rows and the thresholds.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    pub rows: usize,
}

impl RenderSink for ConsoleSink {
    fn render(&self, output: &AlignedOutput, meta: &RenderMeta) -> Result<()> {
        check_meta(output, meta)?;
        println!("📄 First {} rows for {} (W={})", self.rows.min(output.len()), meta.symbol, output.window_size);
        for k in 0..std::cmp::min(self.rows, output.len()) {
            let ts = utils::format_timestamp(output.timestamps[k])
                .map_err(|e| PipelineError::RenderFailed(e.to_string()))?;
            let energies: Vec<String> = output
                .band_names
                .iter()
                .zip(&output.energies)
                .map(|(name, band)| format!("{}: {:.6}", name, band[k]))
                .collect();
            println!(" - ts: {}, price: {:.2}, {}", ts, output.prices[k], energies.join(", "));
        }
        for (threshold, style) in meta.thresholds.iter().zip(&meta.styles) {
            println!(
                " ⚠️ {} [{}] threshold: {:.6} (mean {:.6} + {} x std {:.6})",
                style.label, style.color, threshold.value, threshold.mean, threshold.multiplier, threshold.std_dev
            );
        }
        Ok(())
    }
}

fn check_meta(output: &AlignedOutput, meta: &RenderMeta) -> Result<()> {
    let bands = output.band_names.len();
    if meta.styles.len() != bands || meta.thresholds.len() != bands {
        return Err(PipelineError::invalid(format!(
            "{}: metadata describes {} styles and {} thresholds for {} bands",
            meta.symbol,
            meta.styles.len(),
            meta.thresholds.len(),
            bands
        )));
    }
    if let Some(overlay) = meta.overlays.iter().find(|o| o.values.len() != output.len()) {
        return Err(PipelineError::invalid(format!(
            "{}: overlay '{}' has {} values for {} rows",
            meta.symbol,
            overlay.name,
            overlay.values.len(),
            output.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output() -> AlignedOutput {
        AlignedOutput {
            window_size: 4,
            timestamps: vec![86_400, 172_800],
            prices: vec![10.5, 11.0],
            band_names: vec!["retail".to_string(), "whale".to_string()],
            energies: vec![vec![0.1, 0.2], vec![0.3, 0.4]],
        }
    }

    fn meta(output: &AlignedOutput) -> RenderMeta {
        let styles = output
            .band_names
            .iter()
            .enumerate()
            .map(|(i, name)| BandStyle::for_band(name, i))
            .collect();
        let thresholds = output
            .band_names
            .iter()
            .zip(&output.energies)
            .map(|(name, series)| Threshold::new(name.clone(), BandStats::from_series(series).unwrap(), 1.5))
            .collect();
        RenderMeta {
            symbol: "BTC-USD".to_string(),
            styles,
            thresholds,
            overlays: vec![Overlay { name: "observed_retail".to_string(), values: vec![0.11, 0.19] }],
        }
    }

    #[test]
    fn test_csv_sink_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path());
        let output = output();
        sink.render(&output, &meta(&output)).unwrap();

        let series = std::fs::read_to_string(sink.series_path("BTC-USD")).unwrap();
        let mut lines = series.lines();
        assert_eq!(lines.next().unwrap(), "timestamp,datetime,price,retail,whale,observed_retail");
        assert_eq!(lines.next().unwrap(), "86400,1970-01-02 00:00:00,10.5,0.1,0.3,0.11");
        assert_eq!(lines.count(), 1);

        let thresholds = std::fs::read_to_string(sink.thresholds_path("BTC-USD")).unwrap();
        let mut lines = thresholds.lines();
        assert_eq!(lines.next().unwrap(), "band,mean,std_dev,multiplier,threshold,label,color");
        assert!(lines.next().unwrap().starts_with("retail,"));
        assert!(lines.next().unwrap().ends_with(",magenta"));
    }

    #[test]
    fn test_rejects_inconsistent_meta() {
        let output = output();
        let mut meta = meta(&output);
        meta.overlays[0].values.pop();
        assert!(ConsoleSink { rows: 5 }.render(&output, &meta).is_err());

        let mut meta = self::meta(&output);
        meta.styles.pop();
        assert!(ConsoleSink { rows: 5 }.render(&output, &meta).is_err());
    }

    #[test]
    fn test_palette_fallback() {
        assert_eq!(BandStyle::for_band("whale", 0).color, "magenta");
        assert_eq!(BandStyle::for_band("custom", 2).color, "yellow");
        assert_eq!(BandStyle::for_band("custom", 8).color, "yellow");
    }
}
