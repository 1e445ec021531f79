use crate::error::{PipelineError, Result};

/// Named half-open range `[lo, hi)` of spectrum bins.
///
/// Bin 0 is the window mean and never belongs to a band.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SpectrumBand {
    pub name: String,
    pub lo: usize,
    pub hi: usize,
}

impl SpectrumBand {
    pub fn new(name: impl Into<String>, lo: usize, hi: usize) -> Self {
        Self { name: name.into(), lo, hi }
    }

    /// Builds a band from a range of cycle lengths instead of raw bin indices.
    ///
    /// Bin `k` of a `window_size`-sample transform sampled every
    /// `interval_secs` completes one cycle in `window_size * interval_secs / k`
    /// seconds. The band covers every bin whose cycle length lies within
    /// `[shortest_secs, longest_secs]`.
    ///
    /// # Arguments
    /// * `name` - Band name.
    /// * `shortest_secs` - Shortest cycle length to include.
    /// * `longest_secs` - Longest cycle length to include.
    /// * `interval_secs` - Sampling interval of the return series.
    /// * `window_size` - Transform length.
    ///
    /// # Errors
    /// * `InvalidInput` if a duration is zero, the range is inverted, the
    ///   longest cycle exceeds the window span, or no bin falls in range.
    pub fn from_periods(
        name: impl Into<String>,
        shortest_secs: u64,
        longest_secs: u64,
        interval_secs: u64,
        window_size: usize,
    ) -> Result<Self> {
        let name = name.into();
        if shortest_secs == 0 || interval_secs == 0 || window_size == 0 {
            return Err(PipelineError::invalid(format!(
                "band '{}': periods, interval and window size must be positive",
                name
            )));
        }
        if shortest_secs > longest_secs {
            return Err(PipelineError::invalid(format!(
                "band '{}': shortest cycle {}s exceeds longest {}s",
                name, shortest_secs, longest_secs
            )));
        }

        let span = window_size as u64 * interval_secs;
        if longest_secs > span {
            return Err(PipelineError::invalid(format!(
                "band '{}': cycle of {}s is longer than the {}s window span",
                name, longest_secs, span
            )));
        }

        let lo = span.div_ceil(longest_secs) as usize;
        let hi = (span / shortest_secs) as usize + 1;
        if lo >= hi {
            return Err(PipelineError::invalid(format!(
                "band '{}': no spectrum bin has a cycle between {}s and {}s",
                name, shortest_secs, longest_secs
            )));
        }
        Ok(Self { name, lo, hi })
    }

    fn overlaps(&self, other: &SpectrumBand) -> bool {
        self.lo < other.hi && other.lo < self.hi
    }

    /// Checks the band against the Nyquist bound of a `window_size` transform.
    pub fn validate(&self, window_size: usize) -> Result<()> {
        let nyquist = window_size / 2 + 1;
        if self.lo < 1 {
            return Err(PipelineError::invalid(format!(
                "band '{}': lo must be >= 1 (bin 0 is the mean level), got {}",
                self.name, self.lo
            )));
        }
        if self.lo >= self.hi {
            return Err(PipelineError::invalid(format!(
                "band '{}': empty range [{}, {})",
                self.name, self.lo, self.hi
            )));
        }
        if self.hi > nyquist {
            return Err(PipelineError::invalid(format!(
                "band '{}': hi {} exceeds Nyquist bound {} for window size {}",
                self.name, self.hi, nyquist, window_size
            )));
        }
        Ok(())
    }
}

impl std::str::FromStr for SpectrumBand {
    type Err = PipelineError;

    /// Parses `name=lo:hi`.
    fn from_str(s: &str) -> Result<Self> {
        let (name, range) = s
            .split_once('=')
            .ok_or_else(|| PipelineError::invalid(format!("band '{}' must look like name=lo:hi", s)))?;
        let (lo, hi) = range
            .split_once(':')
            .ok_or_else(|| PipelineError::invalid(format!("band '{}' must look like name=lo:hi", s)))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(PipelineError::invalid(format!("band '{}' has an empty name", s)));
        }
        let lo = lo
            .trim()
            .parse::<usize>()
            .map_err(|e| PipelineError::invalid(format!("band '{}': bad lo: {}", name, e)))?;
        let hi = hi
            .trim()
            .parse::<usize>()
            .map_err(|e| PipelineError::invalid(format!("band '{}': bad hi: {}", name, e)))?;
        Ok(SpectrumBand::new(name, lo, hi))
    }
}

/// Ordered collection of bands evaluated on every window.
///
/// Overlapping bands are rejected unless the set was built with
/// [`BandSet::with_overlap`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BandSet {
    bands: Vec<SpectrumBand>,
    allow_overlap: bool,
}

impl BandSet {
    pub fn new(bands: Vec<SpectrumBand>) -> Self {
        Self { bands, allow_overlap: false }
    }

    /// Same as [`BandSet::new`] but explicitly permits overlapping ranges.
    pub fn with_overlap(bands: Vec<SpectrumBand>) -> Self {
        Self { bands, allow_overlap: true }
    }

    pub fn push(&mut self, band: SpectrumBand) {
        self.bands.push(band);
    }

    pub fn set_allow_overlap(&mut self, allow: bool) {
        self.allow_overlap = allow;
    }

    pub fn bands(&self) -> &[SpectrumBand] {
        &self.bands
    }

    pub fn names(&self) -> Vec<String> {
        self.bands.iter().map(|b| b.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Validates every band for a `window_size` transform, plus name
    /// uniqueness and the overlap policy.
    pub fn validate(&self, window_size: usize) -> Result<()> {
        if self.bands.is_empty() {
            return Err(PipelineError::invalid("at least one spectrum band is required"));
        }
        for band in &self.bands {
            band.validate(window_size)?;
        }
        for (i, a) in self.bands.iter().enumerate() {
            for b in &self.bands[i + 1..] {
                if a.name == b.name {
                    return Err(PipelineError::invalid(format!("duplicate band name '{}'", a.name)));
                }
                if !self.allow_overlap && a.overlaps(b) {
                    return Err(PipelineError::invalid(format!(
                        "bands '{}' [{}, {}) and '{}' [{}, {}) overlap; overlap must be requested explicitly",
                        a.name, a.lo, a.hi, b.name, b.lo, b.hi
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nyquist_bound() {
        // W = 48 -> bins 0..=24, so hi may reach 25
        assert!(SpectrumBand::new("full", 1, 25).validate(48).is_ok());
        assert!(SpectrumBand::new("over", 1, 26).validate(48).is_err());
        // odd window: W = 5 -> hi <= 3
        assert!(SpectrumBand::new("full", 1, 3).validate(5).is_ok());
        assert!(SpectrumBand::new("over", 1, 4).validate(5).is_err());
    }

    #[test]
    fn test_rejects_dc_and_empty() {
        assert!(matches!(
            SpectrumBand::new("dc", 0, 4).validate(30),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(SpectrumBand::new("empty", 4, 4).validate(30).is_err());
        assert!(SpectrumBand::new("inverted", 6, 4).validate(30).is_err());
    }

    #[test]
    fn test_overlap_policy() {
        let bands = vec![SpectrumBand::new("a", 1, 6), SpectrumBand::new("b", 5, 10)];
        assert!(BandSet::new(bands.clone()).validate(30).is_err());
        assert!(BandSet::with_overlap(bands).validate(30).is_ok());

        let touching = vec![SpectrumBand::new("a", 1, 5), SpectrumBand::new("b", 5, 10)];
        assert!(BandSet::new(touching).validate(30).is_ok());
    }

    #[test]
    fn test_duplicate_names_and_empty_set() {
        let dup = vec![SpectrumBand::new("a", 1, 3), SpectrumBand::new("a", 4, 6)];
        assert!(BandSet::with_overlap(dup).validate(30).is_err());
        assert!(BandSet::default().validate(30).is_err());
    }

    #[test]
    fn test_parse_band() {
        let band: SpectrumBand = "retail=1:5".parse().unwrap();
        assert_eq!(band, SpectrumBand::new("retail", 1, 5));
        assert!("retail".parse::<SpectrumBand>().is_err());
        assert!("retail=1-5".parse::<SpectrumBand>().is_err());
        assert!("=1:5".parse::<SpectrumBand>().is_err());
        assert!("x=a:5".parse::<SpectrumBand>().is_err());
    }

    #[test]
    fn test_from_periods_hourly() {
        // 48 hourly samples: bin k has a 48/k hour cycle.
        // 12h..24h cycles -> k in [2, 4]
        let band = SpectrumBand::from_periods("day", 12 * 3600, 24 * 3600, 3600, 48).unwrap();
        assert_eq!((band.lo, band.hi), (2, 5));
        // 2h..4h cycles -> k in [12, 24]
        let band = SpectrumBand::from_periods("fast", 2 * 3600, 4 * 3600, 3600, 48).unwrap();
        assert_eq!((band.lo, band.hi), (12, 25));
        assert!(band.validate(48).is_ok());
    }

    #[test]
    fn test_from_periods_rejects_unresolvable() {
        // longer than the window span
        assert!(SpectrumBand::from_periods("slow", 3600, 72 * 3600, 3600, 48).is_err());
        // inverted
        assert!(SpectrumBand::from_periods("x", 10 * 3600, 5 * 3600, 3600, 48).is_err());
        // between two bins: 48/7 = 6.86h, 48/6 = 8h
        assert!(SpectrumBand::from_periods("gap", 7 * 3600, 7 * 3600 + 1800, 3600, 48).is_err());
        assert!(SpectrumBand::from_periods("zero", 0, 3600, 3600, 48).is_err());
    }
}
