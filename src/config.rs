use crate::bands::{BandSet, SpectrumBand};
use crate::error::{PipelineError, Result};
use crate::taper::Taper;

/// Default multiplier for the `mean + k * std_dev` threshold.
pub const DEFAULT_THRESHOLD_MULTIPLIER: f64 = 1.5;

/// Everything the analyzer needs to turn a return series into band energies.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub window_size: usize,
    pub bands: BandSet,
    pub taper: Taper,
    pub threshold_multiplier: f64,
}

impl AnalysisConfig {
    pub fn new(window_size: usize, bands: BandSet) -> Self {
        Self {
            window_size,
            bands,
            taper: Taper::default(),
            threshold_multiplier: DEFAULT_THRESHOLD_MULTIPLIER,
        }
    }

    pub fn with_taper(mut self, taper: Taper) -> Self {
        self.taper = taper;
        self
    }

    pub fn with_threshold_multiplier(mut self, k: f64) -> Self {
        self.threshold_multiplier = k;
        self
    }

    /// Checks the parts of the configuration that do not depend on data.
    ///
    /// Whether the window fits the series is checked by the analyzer.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(PipelineError::invalid("window size must be at least 1"));
        }
        self.bands.validate(self.window_size)?;
        self.taper.weights(self.window_size)?;
        if !self.threshold_multiplier.is_finite() {
            return Err(PipelineError::invalid(format!(
                "threshold multiplier must be finite, got {}",
                self.threshold_multiplier
            )));
        }
        Ok(())
    }
}

/// Parameter sets of the two original market scanners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// 30 daily samples, one band over bins `[1, W/2)`.
    Pulse,
    /// 48 hourly samples, slow band `[1, 5)` and fast band `[10, 20)`.
    Whale,
}

impl Preset {
    pub fn window_size(self) -> usize {
        match self {
            Preset::Pulse => 30,
            Preset::Whale => 48,
        }
    }

    pub fn config(self) -> AnalysisConfig {
        self.config_for_window(self.window_size())
    }

    /// Preset bands for a custom window size. The pulse band follows the
    /// window (`[1, W/2)`); the whale bands are literal bin indices.
    pub fn config_for_window(self, window_size: usize) -> AnalysisConfig {
        let bands = match self {
            Preset::Pulse => vec![SpectrumBand::new("total", 1, window_size / 2)],
            Preset::Whale => vec![
                SpectrumBand::new("retail", 1, 5),
                SpectrumBand::new("whale", 10, 20),
            ],
        };
        AnalysisConfig::new(window_size, BandSet::new(bands))
    }

    pub fn interval(self) -> Interval {
        match self {
            Preset::Pulse => Interval { secs: 86_400 },
            Preset::Whale => Interval { secs: 3_600 },
        }
    }

    pub fn period(self) -> Period {
        match self {
            Preset::Pulse => Period::Span(2 * 365 * 86_400),
            Preset::Whale => Period::Span(365 * 86_400),
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pulse" => Ok(Preset::Pulse),
            "whale" => Ok(Preset::Whale),
            other => Err(PipelineError::invalid(format!("unknown preset '{}'", other))),
        }
    }
}

/// Sampling interval of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    secs: u64,
}

impl Interval {
    /// # Errors
    /// * `InvalidInput` if `secs` is zero.
    pub fn from_secs(secs: u64) -> Result<Self> {
        if secs == 0 {
            return Err(PipelineError::invalid("interval must be at least one second"));
        }
        Ok(Self { secs })
    }

    pub fn secs(&self) -> u64 {
        self.secs
    }
}

impl std::str::FromStr for Interval {
    type Err = PipelineError;

    /// Accepts `1m`, `5m`, `15m`, `30m`, `1h`, `4h`, `1d` and other
    /// `<n><unit>` combinations with units `m`, `h`, `d`.
    fn from_str(s: &str) -> Result<Self> {
        let secs = parse_duration(s, &[("m", 60), ("h", 3_600), ("d", 86_400)])?;
        Ok(Interval { secs })
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.secs {
            s if s % 86_400 == 0 => write!(f, "{}d", s / 86_400),
            s if s % 3_600 == 0 => write!(f, "{}h", s / 3_600),
            s if s % 60 == 0 => write!(f, "{}m", s / 60),
            s => write!(f, "{}s", s),
        }
    }
}

/// How far back from the last sample to keep data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Max,
    Span(u64),
}

impl std::str::FromStr for Period {
    type Err = PipelineError;

    /// Accepts `max` or `<n><unit>` with units `d`, `wk`, `mo`, `y`.
    fn from_str(s: &str) -> Result<Self> {
        if s == "max" {
            return Ok(Period::Max);
        }
        let secs = parse_duration(
            s,
            &[("d", 86_400), ("wk", 7 * 86_400), ("mo", 30 * 86_400), ("y", 365 * 86_400)],
        )?;
        Ok(Period::Span(secs))
    }
}

fn parse_duration(s: &str, units: &[(&str, u64)]) -> Result<u64> {
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (count, unit) = s.split_at(split);
    let count = count
        .parse::<u64>()
        .map_err(|_| PipelineError::invalid(format!("'{}' must start with a number", s)))?;
    if count == 0 {
        return Err(PipelineError::invalid(format!("'{}' must be positive", s)));
    }
    units
        .iter()
        .find(|(name, _)| *name == unit)
        .ok_or_else(|| PipelineError::invalid(format!("unknown unit '{}' in '{}'", unit, s)))
        .and_then(|(_, secs)| {
            count
                .checked_mul(*secs)
                .ok_or_else(|| PipelineError::invalid(format!("'{}' is too long", s)))
        })
}
