mod cli;
mod progress;

use anyhow::Context;
use spectral_pulse::render::{ConsoleSink, CsvSink, RenderSink};
use spectral_pulse::source::CsvDataSource;

/// Main entry point of the application.
///
/// This function orchestrates the entire workflow:
/// 1. Parses command-line arguments and resolves the analysis settings.
/// 2. Validates input/output paths.
/// 3. Determines the number of threads to use.
/// 4. Runs the spectral pipeline for every symbol and writes the aligned output.
/// 5. Optionally prints the first rows of every result.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Success or an error if any step fails.
fn main() -> anyhow::Result<()> {
    let total_start = std::time::Instant::now();
    let args = cli::Args::parse();

    let pb = progress::progress_bar()?;
    let log_writer = progress::LogWriter::new(&pb);
    let log_level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(move || log_writer.clone())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = args.settings().context("Invalid analysis settings")?;
    println!(
        "Start analysis: W={}, bands={:?}, taper={}, interval={}",
        settings.config.window_size,
        settings.config.bands.names(),
        settings.config.taper.name(),
        settings.interval,
    );

    if !args.input.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", args.input.display());
    }
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output.display()))?;

    let effective_threads = match args.threads {
        Some(n) => {
            let max_threads = num_cpus::get();
            if n > max_threads {
                println!("⚠️ Warning: Limiting thread count to {} (max available)", max_threads);
                max_threads
            } else {
                n
            }
        }
        None => rayon::current_num_threads(),
    };
    println!("🚀 Using {} thread(s)", effective_threads);

    let source = CsvDataSource::new(&args.input);
    let csv_sink = CsvSink::new(&args.output);
    let console_sink = ConsoleSink { rows: 5 };
    let sinks: Vec<&(dyn RenderSink + Sync)> = vec![&csv_sink];
    let console: Option<&(dyn RenderSink + Sync)> = if args.check { Some(&console_sink) } else { None };

    let run = || progress::process_symbols(&args.symbols, &settings, &source, &sinks, console, &pb);
    let summary = if args.threads.is_some() {
        let local_pool = spectral_pulse::utils::configure_thread_pool(effective_threads)?;
        local_pool.install(run)?
    } else {
        run()?
    };

    println!(
        "✅ Analysis completed in {:?} seconds ({} ok, {} failed)",
        total_start.elapsed().as_secs_f64(),
        summary.processed,
        summary.failed.len(),
    );

    if !summary.failed.is_empty() {
        let names: Vec<&str> = summary.failed.iter().map(|(s, _)| s.as_str()).collect();
        anyhow::bail!("{} symbol(s) failed: {}", names.len(), names.join(", "));
    }
    Ok(())
}
