use spectral_pulse::bands::{BandSet, SpectrumBand};
use spectral_pulse::config::{AnalysisConfig, Interval, Period, Preset};
use spectral_pulse::noise::NoiseOverlay;
use spectral_pulse::taper::Taper;

/// Band given as a range of cycle lengths in hours: `name=short:long`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBand {
    pub name: String,
    pub shortest_hours: f64,
    pub longest_hours: f64,
}

/// Structure representing command-line arguments.
#[derive(Debug)]
pub struct Args {
    pub input: std::path::PathBuf,
    pub output: std::path::PathBuf,
    pub symbols: Vec<String>,
    pub preset: Preset,
    pub period: Option<Period>,
    pub interval: Option<Interval>,
    pub window: Option<usize>,
    pub bands: Vec<SpectrumBand>,
    pub period_bands: Vec<PeriodBand>,
    pub taper: Option<Taper>,
    pub threshold_multiplier: Option<f64>,
    pub allow_overlap: bool,
    pub threads: Option<usize>,
    pub noise_sigma: Option<f64>,
    pub noise_seed: Option<u64>,
    pub check: bool,
    pub verbose: bool,
}

/// Fully resolved run settings.
#[derive(Debug)]
pub struct RunSettings {
    pub config: AnalysisConfig,
    pub period: Period,
    pub interval: Interval,
    pub noise: Option<NoiseOverlay>,
}

/// Command-line arguments parser using Clap.
///
/// Supports input/output paths, threading, presets and explicit band definitions with validation.
impl Args {
    /// Parses command-line arguments using `clap`.
    ///
    /// # Returns
    /// * `Args` - Struct containing parsed arguments.
    ///
    /// # Errors
    /// * If required arguments are missing or invalid.
    pub fn parse() -> Self {
        Self::from_matches(command().get_matches())
    }

    fn from_matches(matches: clap::ArgMatches) -> Self {
        Args {
            input: matches.get_one::<std::path::PathBuf>("input").cloned().unwrap_or_default(),
            output: matches.get_one::<std::path::PathBuf>("output").cloned().unwrap_or_default(),
            symbols: matches
                .get_many::<String>("symbols")
                .map(|v| v.cloned().collect())
                .unwrap_or_default(),
            preset: matches.get_one::<Preset>("preset").copied().unwrap_or(Preset::Pulse),
            period: matches.get_one::<Period>("period").copied(),
            interval: matches.get_one::<Interval>("interval").copied(),
            window: matches.get_one::<usize>("window").copied(),
            bands: matches
                .get_many::<SpectrumBand>("band")
                .map(|v| v.cloned().collect())
                .unwrap_or_default(),
            period_bands: matches
                .get_many::<PeriodBand>("band-period")
                .map(|v| v.cloned().collect())
                .unwrap_or_default(),
            taper: matches.get_one::<Taper>("taper").cloned(),
            threshold_multiplier: matches.get_one::<f64>("threshold-multiplier").copied(),
            allow_overlap: matches.get_flag("allow-overlap"),
            threads: matches.get_one::<usize>("threads").copied(),
            noise_sigma: matches.get_one::<f64>("noise-sigma").copied(),
            noise_seed: matches.get_one::<u64>("noise-seed").copied(),
            check: matches.get_flag("check"),
            verbose: matches.get_flag("verbose"),
        }
    }

    /// Resolves the preset and the explicit overrides into run settings.
    ///
    /// Explicit `--band`/`--band-period` values replace the preset bands;
    /// `--band-period` ranges are converted to bin indices through the interval.
    ///
    /// # Errors
    /// * If a band cannot be derived or the resulting configuration is invalid.
    pub fn settings(&self) -> anyhow::Result<RunSettings> {
        let interval = self.interval.unwrap_or_else(|| self.preset.interval());
        let period = self.period.unwrap_or_else(|| self.preset.period());
        let window = self.window.unwrap_or_else(|| self.preset.window_size());

        let mut config = self.preset.config_for_window(window);
        if !self.bands.is_empty() || !self.period_bands.is_empty() {
            let mut bands = BandSet::default();
            for band in &self.bands {
                bands.push(band.clone());
            }
            for pb in &self.period_bands {
                bands.push(SpectrumBand::from_periods(
                    pb.name.clone(),
                    hours_to_secs(pb.shortest_hours),
                    hours_to_secs(pb.longest_hours),
                    interval.secs(),
                    window,
                )?);
            }
            config.bands = bands;
        }
        config.bands.set_allow_overlap(self.allow_overlap);
        if let Some(taper) = &self.taper {
            config.taper = taper.clone();
        }
        if let Some(k) = self.threshold_multiplier {
            config.threshold_multiplier = k;
        }
        config.validate()?;

        let noise = self
            .noise_sigma
            .map(|sigma| NoiseOverlay::new(sigma, self.noise_seed))
            .transpose()?;

        Ok(RunSettings { config, period, interval, noise })
    }
}

fn command() -> clap::Command {
    clap::Command::new("spectral-pulse")
        .version("0.1.0")
        .about("Sliding-window spectral energy of price returns")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("Directory with <SYMBOL>.csv price exports")
                .required(true)
                .num_args(1)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("Directory for aligned spectral output")
                .required(true)
                .num_args(1)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::Arg::new("symbols")
                .short('s')
                .long("symbols")
                .help("Comma separated symbols to analyze")
                .value_delimiter(',')
                .action(clap::ArgAction::Append)
                .default_value("BTC-USD"),
        )
        .arg(
            clap::Arg::new("preset")
                .long("preset")
                .help("Parameter set: pulse (30 daily samples, one band) or whale (48 hourly samples, two bands)")
                .num_args(1)
                .value_parser(clap::builder::ValueParser::new(parse_from_str::<Preset>)),
        )
        .arg(
            clap::Arg::new("period")
                .short('p')
                .long("period")
                .help("How much history to keep: max, 30d, 6mo, 1y, 2y, ...")
                .num_args(1)
                .value_parser(clap::builder::ValueParser::new(parse_from_str::<Period>)),
        )
        .arg(
            clap::Arg::new("interval")
                .long("interval")
                .help("Sampling interval: 1m, 5m, 15m, 30m, 1h, 4h, 1d, ...")
                .num_args(1)
                .value_parser(clap::builder::ValueParser::new(parse_from_str::<Interval>)),
        )
        .arg(
            clap::Arg::new("window")
                .short('w')
                .long("window")
                .help("Window size in samples")
                .num_args(1)
                .value_parser(clap::builder::ValueParser::new(parse_usize_positive)),
        )
        .arg(
            clap::Arg::new("band")
                .short('b')
                .long("band")
                .help("Band as name=lo:hi spectrum bin indices (repeatable)")
                .action(clap::ArgAction::Append)
                .value_parser(clap::builder::ValueParser::new(parse_from_str::<SpectrumBand>)),
        )
        .arg(
            clap::Arg::new("band-period")
                .long("band-period")
                .help("Band as name=short:long cycle lengths in hours (repeatable)")
                .action(clap::ArgAction::Append)
                .value_parser(clap::builder::ValueParser::new(parse_period_band)),
        )
        .arg(
            clap::Arg::new("taper")
                .long("taper")
                .help("Window taper: hann or rectangular")
                .num_args(1)
                .value_parser(clap::builder::ValueParser::new(parse_from_str::<Taper>)),
        )
        .arg(
            clap::Arg::new("threshold-multiplier")
                .short('k')
                .long("threshold-multiplier")
                .help("k in mean + k * std_dev (default 1.5)")
                .num_args(1)
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            clap::Arg::new("allow-overlap")
                .long("allow-overlap")
                .help("Permit overlapping bands")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("threads")
                .short('t')
                .long("threads")
                .help("Number of threads to use (default: all available)")
                .num_args(1)
                .value_parser(clap::builder::ValueParser::new(parse_usize_positive)),
        )
        .arg(
            clap::Arg::new("noise-sigma")
                .long("noise-sigma")
                .help("Add an observed_<band> column with Gaussian noise of this sigma")
                .num_args(1)
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            clap::Arg::new("noise-seed")
                .long("noise-seed")
                .help("Seed for the noise overlay (reproducible output)")
                .num_args(1)
                .requires("noise-sigma")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            clap::Arg::new("check")
                .short('c')
                .long("check")
                .help("Print the first 5 aligned rows and thresholds of every symbol")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
}

fn hours_to_secs(hours: f64) -> u64 {
    (hours * 3_600.0).round() as u64
}

/// Validates that a count is a positive integer.
///
/// # Arguments
/// * `s` - String representation of the number.
///
/// # Returns
/// * `Result<usize>` - Validated number.
fn parse_usize_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("Must be a positive integer".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("Not a valid number: {}", e)),
    }
}

fn parse_from_str<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    s.parse::<T>().map_err(|e| e.to_string())
}

/// Parses `name=short:long` with cycle lengths in hours.
fn parse_period_band(s: &str) -> Result<PeriodBand, String> {
    let (name, range) = s
        .split_once('=')
        .ok_or_else(|| format!("'{}' must look like name=short:long", s))?;
    let (short, long) = range
        .split_once(':')
        .ok_or_else(|| format!("'{}' must look like name=short:long", s))?;
    let shortest_hours = short
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad shortest cycle in '{}': {}", s, e))?;
    let longest_hours = long
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad longest cycle in '{}': {}", s, e))?;
    if name.trim().is_empty() || !shortest_hours.is_finite() || shortest_hours <= 0.0 || !longest_hours.is_finite() {
        return Err(format!("'{}' needs a name and positive cycle lengths", s));
    }
    Ok(PeriodBand {
        name: name.trim().to_string(),
        shortest_hours,
        longest_hours,
    })
}
