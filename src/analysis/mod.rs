//! Analysis layer: pressure series → derived collections.
//!
//! Architecture:
//! ```text
//!   DataCollection
//!     │          │
//!     ▼          ▼
//!  ┌────────┐  ┌──────────┐
//!  │ excess │  │ spectral │  FFT cross/auto power, log-binned
//!  └────────┘  └──────────┘
//!     │
//!     ▼
//!  ┌────────┐
//!  │ allan  │  second-difference variance per pair
//!  └────────┘
//! ```
//!
//! Every engine deep-copies the input specifications and returns a new
//! result; inputs are never modified.

pub mod allan;
pub mod excess;
pub mod pairs;
pub mod spectral;

use crate::config::AnalysisConfig;
use crate::data::model::DataCollection;
use crate::error::Result;

pub use allan::{allan_variance, AllanVarianceResult};
pub use excess::{excess_path_length, ExcessPathLengthResult};
pub use pairs::{ResultKey, StationPair};
pub use spectral::{
    auto_correlate, correlate, cross_correlate, AutoCorrelation, Correlation, CorrelationResult,
    CrossCorrelation,
};

/// Subtract the arithmetic mean. Empty input yields empty output.
pub fn remove_mean(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| v - mean).collect()
}

/// All derived collections for one input collection.
#[derive(Debug, Clone)]
pub struct Report {
    pub excess: ExcessPathLengthResult,
    pub allan: AllanVarianceResult,
    pub correlation: Correlation,
}

/// Run excess path length → Allan variance, and the correlation spectra.
pub fn run(collection: &DataCollection, config: &AnalysisConfig) -> Result<Report> {
    let excess = excess_path_length(collection, config)?;
    let allan = allan_variance(&excess, config)?;
    let correlation = correlate(collection, config)?;
    Ok(Report {
        excess,
        allan,
        correlation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_mean_is_idempotent() {
        let x = [3.0, 1.25, -7.5, 10.0, 0.1];
        let once = remove_mean(&x);
        let twice = remove_mean(&once);
        assert!(once.iter().sum::<f64>().abs() < 1e-12);
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() <= f64::EPSILON * 16.0);
        }
        assert!(remove_mean(&[]).is_empty());
    }
}
