//! # spectral-pulse
//!
//! Sliding-window spectral energy of price returns.
//!
//! A price series is turned into log returns, a tapered FFT is slid across
//! them, and each window's magnitude spectrum is reduced to one energy per
//! named frequency band. The energies are then aligned back onto the price
//! timeline for display.
//!
//! ```rust,ignore
//! use spectral_pulse::{config::Preset, pipeline, returns::PricePoint};
//!
//! let prices: Vec<PricePoint> = load();
//! let output = pipeline::run(&prices, &Preset::Whale.config())?;
//! for threshold in output.thresholds() {
//!     println!("{}: {:.4}", threshold.band, threshold.value);
//! }
//! ```

pub mod alignment;
pub mod analyzer;
pub mod bands;
pub mod config;
pub mod error;
pub mod noise;
pub mod pipeline;
pub mod render;
pub mod resample;
pub mod returns;
pub mod source;
pub mod stats;
pub mod taper;
pub mod utils;

pub use alignment::{AlignedOutput, align};
pub use analyzer::{SlidingSpectralAnalyzer, SpectralRecord, SpectralSeries};
pub use bands::{BandSet, SpectrumBand};
pub use config::{AnalysisConfig, Interval, Period, Preset};
pub use error::{PipelineError, Result};
pub use returns::{PricePoint, ReturnSeries, build_returns};
pub use stats::BandStats;
pub use taper::Taper;
