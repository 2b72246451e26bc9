//! Barometric pressure analysis for differential-pressure interferometric
//! links: pairwise excess path length, its Allan variance, and log-binned
//! cross/auto-correlation spectra of multi-station recordings.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod export;

pub use analysis::{
    allan_variance, auto_correlate, correlate, cross_correlate, excess_path_length, AllanVarianceResult,
    Correlation, CorrelationResult, ExcessPathLengthResult, Report, StationPair,
};
pub use config::AnalysisConfig;
pub use data::model::{DataCollection, FilterNumber, Specifications, StationSeries, Units};
pub use error::{Error, Result};
