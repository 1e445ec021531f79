use std::io::Write;

use rayon::prelude::*;

use spectral_pulse::pipeline::{self, SymbolJob, SymbolReport};
use spectral_pulse::render::RenderSink;
use spectral_pulse::source::DataSource;

use crate::cli;

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct Summary {
    pub processed: usize,
    pub failed: Vec<(String, String)>,
}

/// Log writer that hides the progress bar while a line is printed.
///
/// Install it on the subscriber before the workers start so log lines from
/// rayon threads never tear the bar.
#[derive(Clone)]
pub struct LogWriter {
    pb: indicatif::ProgressBar,
}

impl LogWriter {
    pub fn new(pb: &indicatif::ProgressBar) -> Self {
        Self { pb: pb.clone() }
    }
}

impl std::io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pb.suspend(|| std::io::stdout().lock().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stdout().flush()
    }
}

/// Creates the batch progress bar. Its length is set by `process_symbols`.
pub fn progress_bar() -> anyhow::Result<indicatif::ProgressBar> {
    let pb = indicatif::ProgressBar::new(0);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    anyhow::Ok(pb)
}

/// Runs the pipeline for every symbol in parallel, with a progress bar.
///
/// A failing symbol is reported and skipped; the others keep going.
///
/// # Arguments
/// * `symbols` - Symbols to analyze.
/// * `settings` - Resolved analysis settings shared by all symbols.
/// * `source` - Price provider.
/// * `sinks` - Every sink receives every successful symbol, inside the workers.
/// * `console` - Optional sink run after the bar is cleared, in symbol order.
/// * `pb` - Progress bar from `progress_bar`.
///
/// # Returns
/// * `anyhow::Result<Summary>` - Counts of processed and failed symbols.
pub fn process_symbols(
    symbols: &[String],
    settings: &cli::RunSettings,
    source: &dyn DataSource,
    sinks: &[&(dyn RenderSink + Sync)],
    console: Option<&(dyn RenderSink + Sync)>,
    pb: &indicatif::ProgressBar,
) -> anyhow::Result<Summary> {
    pb.set_length(symbols.len() as u64);

    let results: Vec<(String, Result<SymbolReport, String>)> = symbols
        .par_iter()
        .map(|symbol| {
            let job = SymbolJob {
                symbol,
                period: settings.period,
                interval: settings.interval,
                config: &settings.config,
                noise: settings.noise.as_ref(),
            };
            let result = pipeline::run_symbol(&job, source, sinks).map_err(|e| e.to_string());
            pb.set_message(symbol.clone());
            pb.inc(1);
            (symbol.clone(), result)
        })
        .collect();
    pb.finish_and_clear();

    let mut summary = Summary::default();
    for (symbol, result) in results {
        let result = result.and_then(|report| match console {
            Some(sink) => report.render_to(sink).map(|_| report).map_err(|e| e.to_string()),
            None => Ok(report),
        });
        match result {
            Ok(report) => {
                println!("✅ {}: {} aligned rows", symbol, report.output.aligned.len());
                summary.processed += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", symbol, e);
                println!("⚠️ {}: {}", symbol, e);
                summary.failed.push((symbol, e));
            }
        }
    }
    anyhow::Ok(summary)
}
