//! Cross- and auto-correlation power spectra with dyadic log binning.

use std::collections::BTreeMap;

use num_complex::Complex64;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use super::pairs::{index_pairs, ResultKey, StationPair};
use super::remove_mean;
use crate::config::AnalysisConfig;
use crate::data::model::{DataCollection, Specifications, Units};
use crate::error::{Error, Result};

/// Binned spectra keyed by station pair (cross) or station (auto).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult<K: ResultKey> {
    pub specifications: Specifications,
    /// Representative frequency of each bin.
    #[serde(with = "crate::analysis::pairs::keyed")]
    pub frequencies: BTreeMap<K, Vec<f64>>,
    /// Binned phase-only spectrum `S / |S|`.
    #[serde(with = "crate::analysis::pairs::keyed")]
    pub correlation_norm: BTreeMap<K, Vec<Complex64>>,
    /// Binned un-normalized power `FFT(x_i) * conj(FFT(x_j))`.
    #[serde(with = "crate::analysis::pairs::keyed")]
    pub correlation: BTreeMap<K, Vec<Complex64>>,
}

pub type CrossCorrelation = CorrelationResult<StationPair>;
pub type AutoCorrelation = CorrelationResult<String>;

impl<K: ResultKey> CorrelationResult<K> {
    fn empty(specifications: Specifications) -> Self {
        CorrelationResult {
            specifications,
            frequencies: BTreeMap::new(),
            correlation_norm: BTreeMap::new(),
            correlation: BTreeMap::new(),
        }
    }

    fn insert(&mut self, key: K, binned: Binned) {
        self.frequencies.insert(key.clone(), binned.frequencies);
        self.correlation_norm.insert(key.clone(), binned.correlation_norm);
        self.correlation.insert(key, binned.correlation);
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Cross and auto spectra of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub specifications: Specifications,
    pub cross: CrossCorrelation,
    pub auto: AutoCorrelation,
}

struct Binned {
    frequencies: Vec<f64>,
    correlation_norm: Vec<Complex64>,
    correlation: Vec<Complex64>,
}

// ---------------------------------------------------------------------------
// Spectral primitives
// ---------------------------------------------------------------------------

/// Non-negative-frequency half (`N / 2` bins) of the FFT of the
/// mean-removed series.
pub fn half_spectrum(planner: &mut FftPlanner<f64>, samples: &[f64]) -> Vec<Complex64> {
    let mut buffer: Vec<Complex64> = remove_mean(samples)
        .into_iter()
        .map(|v| Complex64::new(v, 0.0))
        .collect();
    let n = buffer.len();
    if n > 0 {
        let fft = planner.plan_fft_forward(n);
        fft.process(&mut buffer);
    }
    buffer.truncate(n / 2);
    buffer
}

/// `a * conj(b)` element-wise.
pub fn cross_power(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    a.iter().zip(b).map(|(x, y)| x * y.conj()).collect()
}

/// `S / |S|` element-wise; zero-magnitude bins map to zero.
pub fn normalize_spectrum(spectrum: &[Complex64]) -> Vec<Complex64> {
    spectrum
        .iter()
        .map(|s| {
            let magnitude = s.norm();
            if magnitude == 0.0 {
                Complex64::new(0.0, 0.0)
            } else {
                *s / magnitude
            }
        })
        .collect()
}

/// `ceil(log2(len))`, zero for `len < 2`.
pub fn bin_count(len: usize) -> usize {
    if len < 2 {
        return 0;
    }
    len.next_power_of_two().trailing_zeros() as usize
}

/// Mean over the sample ranges `[2^b, 2^(b+1))`, the last range clipped to
/// `len`.
pub fn log_bin(values: &[Complex64]) -> Vec<Complex64> {
    (0..bin_count(values.len()))
        .map(|b| {
            let lo = 1usize << b;
            let hi = (1usize << (b + 1)).min(values.len());
            let window = &values[lo..hi];
            window.iter().sum::<Complex64>() / window.len() as f64
        })
        .collect()
}

/// Bin midpoint `(2^b + 2^(b+1)) / 2` converted to frequency with a period
/// of `len / sampling_frequency`.
pub fn bin_frequencies(len: usize, sampling_frequency: f64) -> Vec<f64> {
    let period = len as f64 / sampling_frequency;
    (0..bin_count(len))
        .map(|b| {
            let lo = (1u64 << b) as f64;
            (lo + 2.0 * lo) / 2.0 / period
        })
        .collect()
}

fn binned(a: &[Complex64], b: &[Complex64], sampling_frequency: f64) -> Binned {
    let power = cross_power(a, b);
    Binned {
        frequencies: bin_frequencies(power.len(), sampling_frequency),
        correlation_norm: log_bin(&normalize_spectrum(&power)),
        correlation: log_bin(&power),
    }
}

// ---------------------------------------------------------------------------
// Engine entry points
// ---------------------------------------------------------------------------

/// Validate the collection and compute each station's half spectrum once.
fn prepare(collection: &DataCollection, config: &AnalysisConfig) -> Result<(Specifications, Vec<Vec<Complex64>>)> {
    let specs = &collection.specifications;
    let units = Units::from([
        ("pressures".to_string(), specs.unit("pressures")?.to_string()),
        ("times".to_string(), specs.unit("times")?.to_string()),
        ("frequency".to_string(), config.frequency_units.clone()),
    ]);
    specs.validate_sampling_frequency()?;
    collection.validate()?;

    let n = collection.sample_count();
    if n / 2 < 2 {
        log::warn!(
            "{}",
            Error::DegenerateInput {
                what: "correlation spectrum binning".to_string(),
                required: 4,
                available: n,
            }
        );
    }

    let mut planner = FftPlanner::new();
    let spectra = collection
        .stations()
        .iter()
        .map(|s| Ok(half_spectrum(&mut planner, &collection.series(s)?.pressures)))
        .collect::<Result<Vec<_>>>()?;

    Ok((specs.with_units(units), spectra))
}

fn cross_from_spectra(
    collection: &DataCollection,
    specifications: Specifications,
    spectra: &[Vec<Complex64>],
) -> CrossCorrelation {
    let stations = collection.stations();
    let fs = collection.specifications.sampling_frequency;
    let mut result = CorrelationResult::empty(specifications);
    for (i, j) in index_pairs(stations.len()) {
        let pair = StationPair::new(stations[i].clone(), stations[j].clone());
        log::debug!("cross-correlating {pair}");
        result.insert(pair, binned(&spectra[i], &spectra[j], fs));
    }
    result
}

fn auto_from_spectra(
    collection: &DataCollection,
    specifications: Specifications,
    spectra: &[Vec<Complex64>],
) -> AutoCorrelation {
    let fs = collection.specifications.sampling_frequency;
    let mut result = CorrelationResult::empty(specifications);
    for (station, spectrum) in collection.stations().iter().zip(spectra) {
        log::debug!("auto-correlating {station}");
        result.insert(station.clone(), binned(spectrum, spectrum, fs));
    }
    result
}

/// Cross-correlation spectra for every canonical station pair.
pub fn cross_correlate(collection: &DataCollection, config: &AnalysisConfig) -> Result<CrossCorrelation> {
    let (specifications, spectra) = prepare(collection, config)?;
    log::info!("Cross-correlating {} stations", spectra.len());
    Ok(cross_from_spectra(collection, specifications, &spectra))
}

/// Auto-correlation spectra for every station.
pub fn auto_correlate(collection: &DataCollection, config: &AnalysisConfig) -> Result<AutoCorrelation> {
    let (specifications, spectra) = prepare(collection, config)?;
    log::info!("Auto-correlating {} stations", spectra.len());
    Ok(auto_from_spectra(collection, specifications, &spectra))
}

/// Both cross and auto spectra, sharing one transform per station.
pub fn correlate(collection: &DataCollection, config: &AnalysisConfig) -> Result<Correlation> {
    let (specifications, spectra) = prepare(collection, config)?;
    log::info!("Correlating {} stations", spectra.len());
    Ok(Correlation {
        cross: cross_from_spectra(collection, specifications.clone(), &spectra),
        auto: auto_from_spectra(collection, specifications.clone(), &spectra),
        specifications,
    })
}
