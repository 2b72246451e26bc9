use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::excess::ExcessPathLengthResult;
use super::pairs::StationPair;
use crate::config::AnalysisConfig;
use crate::data::model::{Specifications, Units};
use crate::error::{Error, Result};

/// Shortest series the estimator is evaluated on.
pub const MIN_SAMPLES: usize = 4;

/// Allan variance of each excess-path-length pair series.
///
/// `allan_var[key][m]` is the variance at averaging time `m * tau`. Only
/// indices `1..len / 2` are computed; index 0 and the tail stay at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllanVarianceResult {
    pub specifications: Specifications,
    pub times: Vec<f64>,
    #[serde(with = "crate::analysis::pairs::keyed")]
    pub allan_var: BTreeMap<StationPair, Vec<f64>>,
}

impl AllanVarianceResult {
    /// Mean sample spacing of the time axis.
    pub fn tau(&self) -> Option<f64> {
        mean_spacing(&self.times)
    }

    /// `(m * tau, variance)` over the computed range of one pair.
    pub fn valid_points(&self, pair: &StationPair) -> Vec<(f64, f64)> {
        let (Some(tau), Some(var)) = (self.tau(), self.allan_var.get(pair)) else {
            return Vec::new();
        };
        (1..var.len() / 2).map(|m| (m as f64 * tau, var[m])).collect()
    }
}

/// Arithmetic mean of first differences; `None` below two samples.
pub fn mean_spacing(times: &[f64]) -> Option<f64> {
    if times.len() < 2 {
        return None;
    }
    let total: f64 = times.windows(2).map(|w| w[1] - w[0]).sum();
    Some(total / (times.len() - 1) as f64)
}

/// Second-difference Allan variance of a phase-like series:
///
/// `AVAR[m] = mean((x[i] - 2 x[i+m] + x[i+2m])^2) / (2 (m tau)^2)`
/// for `1 <= m < N / 2`.
pub fn allan_series(x: &[f64], tau: f64) -> Vec<f64> {
    let n = x.len();
    let mut avar = vec![0.0; n];
    if n < MIN_SAMPLES {
        return avar;
    }
    for m in 1..n / 2 {
        let count = n - 2 * m;
        let sum_sq: f64 = (0..count)
            .map(|i| {
                let d = x[i] - 2.0 * x[i + m] + x[i + 2 * m];
                d * d
            })
            .sum();
        let interval = m as f64 * tau;
        avar[m] = sum_sq / count as f64 / (2.0 * interval * interval);
    }
    avar
}

/// Allan variance for every pair of an excess path length result.
///
/// Series shorter than [`MIN_SAMPLES`], or a time axis without a positive
/// mean spacing, produce all-zero output instead of an error.
pub fn allan_variance(excess: &ExcessPathLengthResult, config: &AnalysisConfig) -> Result<AllanVarianceResult> {
    let specs = &excess.specifications;
    let times_unit = specs.unit("times")?;
    let pressures_unit = specs.unit("pressures")?;

    let tau = match mean_spacing(&excess.times) {
        Some(spacing) if spacing.is_finite() && spacing > 0.0 => Some(spacing),
        Some(spacing) => {
            log::warn!("Allan variance time axis has non-positive mean spacing {spacing}, output is zero");
            None
        }
        None => {
            log::warn!(
                "{}",
                Error::DegenerateInput {
                    what: "Allan variance time axis".to_string(),
                    required: 2,
                    available: excess.times.len(),
                }
            );
            None
        }
    };

    log::info!("Computing Allan variance for {} pairs", excess.excess_path_length.len());

    let mut allan_var = BTreeMap::new();
    for (pair, series) in &excess.excess_path_length {
        if series.len() != excess.times.len() {
            return Err(Error::MismatchedLength {
                station: pair.key(),
                expected: excess.times.len(),
                actual: series.len(),
            });
        }
        log::debug!("Starting Allan variance for {pair}");
        let values = match tau {
            Some(tau) if series.len() >= MIN_SAMPLES => allan_series(series, tau),
            _ => {
                if series.len() < MIN_SAMPLES {
                    log::warn!(
                        "{}",
                        Error::DegenerateInput {
                            what: format!("Allan variance of {pair}"),
                            required: MIN_SAMPLES,
                            available: series.len(),
                        }
                    );
                }
                vec![0.0; series.len()]
            }
        };
        allan_var.insert(pair.clone(), values);
    }

    let units = Units::from([
        ("allan_var".to_string(), config.allan_var_units.clone()),
        ("times".to_string(), times_unit.to_string()),
        ("pressures".to_string(), pressures_unit.to_string()),
    ]);

    Ok(AllanVarianceResult {
        specifications: specs.with_units(units),
        times: excess.times.clone(),
        allan_var,
    })
}
