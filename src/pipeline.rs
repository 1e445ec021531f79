//! prices → returns → windowed spectra → band energies → aligned series.

use crate::alignment::{self, AlignedOutput};
use crate::analyzer::{SlidingSpectralAnalyzer, SpectralSeries};
use crate::config::{AnalysisConfig, Interval, Period};
use crate::error::Result;
use crate::noise::NoiseOverlay;
use crate::render::{BandStyle, Overlay, RenderMeta, RenderSink, Threshold};
use crate::returns::{self, PricePoint};
use crate::source::DataSource;
use crate::stats::BandStats;

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub spectral: SpectralSeries,
    pub aligned: AlignedOutput,
    /// One entry per band, in band order.
    pub stats: Vec<BandStats>,
    pub threshold_multiplier: f64,
}

impl PipelineOutput {
    /// `mean + k * std_dev` for every band, using the configured multiplier.
    pub fn thresholds(&self) -> Vec<Threshold> {
        self.aligned
            .band_names
            .iter()
            .zip(&self.stats)
            .map(|(name, stats)| Threshold::new(name.clone(), *stats, self.threshold_multiplier))
            .collect()
    }

    /// Builds sink metadata. A noise overlay adds one `observed_<band>` column
    /// per band; without it the metadata is fully deterministic.
    pub fn render_meta(&self, symbol: &str, noise: Option<&NoiseOverlay>) -> Result<RenderMeta> {
        let styles = self
            .aligned
            .band_names
            .iter()
            .enumerate()
            .map(|(slot, name)| BandStyle::for_band(name, slot))
            .collect();

        let overlays = match noise {
            Some(noise) => self
                .aligned
                .band_names
                .iter()
                .zip(noise.apply_all(&self.aligned.energies[..])?)
                .map(|(name, values)| Overlay {
                    name: format!("observed_{}", name),
                    values,
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(RenderMeta {
            symbol: symbol.to_string(),
            styles,
            thresholds: self.thresholds(),
            overlays,
        })
    }
}

/// Runs the full analysis on an in-memory price series.
///
/// Pure: identical inputs give bit-identical outputs.
///
/// # Errors
/// * `InvalidInput` from any stage, including an empty energy series when the
///   window leaves no valid offsets.
/// * `AlignmentError` if the aligned lengths disagree.
pub fn run(prices: &[PricePoint], config: &AnalysisConfig) -> Result<PipelineOutput> {
    let analyzer = SlidingSpectralAnalyzer::new(config)?;
    let returns = returns::build_returns(prices)?;
    let spectral = analyzer.analyze(&returns)?;
    let aligned = alignment::align(prices, &spectral)?;
    let stats = aligned
        .energies
        .iter()
        .map(|series| BandStats::from_series(series))
        .collect::<Result<Vec<_>>>()?;

    Ok(PipelineOutput {
        spectral,
        aligned,
        stats,
        threshold_multiplier: config.threshold_multiplier,
    })
}

/// Everything needed to analyze one symbol end to end.
pub struct SymbolJob<'a> {
    pub symbol: &'a str,
    pub period: Period,
    pub interval: Interval,
    pub config: &'a AnalysisConfig,
    pub noise: Option<&'a NoiseOverlay>,
}

/// Pipeline output of one symbol together with the metadata its sinks saw.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReport {
    pub output: PipelineOutput,
    pub meta: RenderMeta,
}

impl SymbolReport {
    /// Hands the report to a sink that was not part of the original run.
    pub fn render_to(&self, sink: &dyn RenderSink) -> Result<()> {
        sink.render(&self.output.aligned, &self.meta)
    }
}

/// Fetches, analyzes and renders one symbol.
///
/// Every sink is invoked even when an earlier one fails; the first sink error
/// is returned after the pipeline output has been produced.
pub fn run_symbol(
    job: &SymbolJob<'_>,
    source: &dyn DataSource,
    sinks: &[&(dyn RenderSink + Sync)],
) -> Result<SymbolReport> {
    let prices = source.fetch_series(job.symbol, job.period, job.interval)?;
    tracing::info!("Analyzing {} ({} prices, W={})", job.symbol, prices.len(), job.config.window_size);

    let output = run(&prices, job.config)?;
    let meta = output.render_meta(job.symbol, job.noise)?;

    let mut first_err = None;
    for sink in sinks {
        if let Err(e) = sink.render(&output.aligned, &meta) {
            tracing::warn!("Sink failed for {}: {}", job.symbol, e);
            first_err.get_or_insert(e);
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(SymbolReport { output, meta }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::{BandSet, SpectrumBand};
    use crate::config::Preset;
    use crate::error::PipelineError;

    fn prices(n: usize) -> Vec<PricePoint> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                PricePoint::new(1_700_000_000 + i as u64 * 86_400, 100.0 * (0.02 * (t * 0.9).sin() + 0.001 * t).exp())
            })
            .collect()
    }

    #[test]
    fn test_pulse_preset_end_to_end() {
        let prices = prices(120);
        let output = run(&prices, &Preset::Pulse.config()).unwrap();
        assert_eq!(output.spectral.len(), 119 - 30);
        assert_eq!(output.aligned.len(), output.spectral.len());
        assert_eq!(output.stats.len(), 1);
        let thresholds = output.thresholds();
        assert_eq!(thresholds[0].band, "total");
        assert!(thresholds[0].value >= output.stats[0].mean);
    }

    #[test]
    fn test_run_is_deterministic() {
        let prices = prices(200);
        let config = Preset::Whale.config();
        let a = run(&prices, &config).unwrap();
        let b = run(&prices, &config).unwrap();
        assert_eq!(a, b);
        let bits = |o: &PipelineOutput| -> Vec<u64> {
            o.aligned.energies.iter().flatten().map(|x| x.to_bits()).collect()
        };
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a.render_meta("X", None).unwrap(), b.render_meta("X", None).unwrap());
    }

    #[test]
    fn test_no_valid_offsets_is_invalid() {
        // 31 prices -> 30 returns -> 0 windows of 30
        let err = run(&prices(31), &Preset::Pulse.config()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn test_noise_overlay_columns() {
        let output = run(&prices(100), &Preset::Whale.config()).unwrap();
        let noise = NoiseOverlay::new(0.01, Some(3)).unwrap();
        let meta = output.render_meta("BTC-USD", Some(&noise)).unwrap();
        assert_eq!(meta.overlays.len(), 2);
        assert_eq!(meta.overlays[1].name, "observed_whale");
        assert_eq!(meta.overlays[0].values.len(), output.aligned.len());
        assert_eq!(meta, output.render_meta("BTC-USD", Some(&noise)).unwrap());
    }

    #[test]
    fn test_noise_differs_between_bands() {
        let output = run(&prices(200), &Preset::Whale.config()).unwrap();
        let noise = NoiseOverlay::new(0.5, Some(9)).unwrap();
        let meta = output.render_meta("BTC-USD", Some(&noise)).unwrap();
        let jitter = |band: usize| -> Vec<f64> {
            meta.overlays[band]
                .values
                .iter()
                .zip(&output.aligned.energies[band])
                .map(|(observed, energy)| observed - energy)
                .collect()
        };
        let (retail, whale) = (jitter(0), jitter(1));
        let equal = retail.iter().zip(&whale).filter(|(a, b)| (*a - *b).abs() < 1e-12).count();
        assert!(equal < retail.len() / 10, "{} of {} rows share noise", equal, retail.len());
    }

    #[test]
    fn test_bad_prices_propagate() {
        let mut prices = prices(60);
        prices[10].price = -1.0;
        let config = AnalysisConfig::new(8, BandSet::new(vec![SpectrumBand::new("a", 1, 5)]));
        assert!(matches!(run(&prices, &config), Err(PipelineError::InvalidInput(_))));
    }
}
