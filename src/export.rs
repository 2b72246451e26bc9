//! Long-format CSV export of derived results for external plotting tools.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analysis::{AllanVarianceResult, CorrelationResult, ExcessPathLengthResult, ResultKey};

#[derive(Serialize)]
struct SeriesRow<'a> {
    key: &'a str,
    time: f64,
    value: f64,
}

#[derive(Serialize)]
struct AllanRow<'a> {
    key: &'a str,
    tau: f64,
    allan_var: f64,
}

#[derive(Serialize)]
struct CorrelationRow<'a> {
    key: &'a str,
    frequency: f64,
    re: f64,
    im: f64,
    norm_re: f64,
    norm_im: f64,
}

/// `key,time,value` for every pair and sample.
pub fn excess_csv<W: Write>(result: &ExcessPathLengthResult, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (pair, series) in &result.excess_path_length {
        let key = pair.key();
        for (&time, &value) in result.times.iter().zip(series) {
            wtr.serialize(SeriesRow { key: &key, time, value })
                .context("writing excess path length row")?;
        }
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

/// `key,tau,allan_var` over the computed range `1 <= m < N / 2`.
pub fn allan_csv<W: Write>(result: &AllanVarianceResult, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for pair in result.allan_var.keys() {
        let key = pair.key();
        for (tau, allan_var) in result.valid_points(pair) {
            wtr.serialize(AllanRow { key: &key, tau, allan_var })
                .context("writing Allan variance row")?;
        }
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

/// `key,frequency,re,im,norm_re,norm_im` for every bin.
pub fn correlation_csv<K: ResultKey + Display, W: Write>(result: &CorrelationResult<K>, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (k, frequencies) in &result.frequencies {
        let key = k.to_string();
        let power = result.correlation.get(k).map(Vec::as_slice).unwrap_or_default();
        let norm = result.correlation_norm.get(k).map(Vec::as_slice).unwrap_or_default();
        for ((&frequency, s), n) in frequencies.iter().zip(power).zip(norm) {
            wtr.serialize(CorrelationRow {
                key: &key,
                frequency,
                re: s.re,
                im: s.im,
                norm_re: n.re,
                norm_im: n.im,
            })
            .context("writing correlation row")?;
        }
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{allan_variance, correlate, excess_path_length};
    use crate::config::AnalysisConfig;
    use crate::data::model::tests::collection;

    fn lines(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes).unwrap().lines().map(String::from).collect()
    }

    fn sample() -> crate::data::model::DataCollection {
        let a: Vec<f64> = (0..16).map(|i| (i as f64 * 0.4).sin()).collect();
        let b: Vec<f64> = (0..16).map(|i| (i as f64 * 0.9).cos()).collect();
        collection(&["a", "b"], vec![a, b], 2.0)
    }

    #[test]
    fn test_excess_csv() {
        let excess = excess_path_length(&sample(), &AnalysisConfig::default()).unwrap();
        let mut out = Vec::new();
        excess_csv(&excess, &mut out).unwrap();
        let rows = lines(out);
        assert_eq!(rows[0], "key,time,value");
        assert_eq!(rows.len(), 17);
        assert!(rows[1].starts_with("a-b,0.0,"));
    }

    #[test]
    fn test_allan_csv_skips_invalid_indices() {
        let config = AnalysisConfig::default();
        let excess = excess_path_length(&sample(), &config).unwrap();
        let allan = allan_variance(&excess, &config).unwrap();
        let mut out = Vec::new();
        allan_csv(&allan, &mut out).unwrap();
        let rows = lines(out);
        assert_eq!(rows[0], "key,tau,allan_var");
        // m = 1..8
        assert_eq!(rows.len(), 1 + 7);
        assert!(rows[1].starts_with("a-b,0.5,"));
    }

    #[test]
    fn test_correlation_csv() {
        let result = correlate(&sample(), &AnalysisConfig::default()).unwrap();
        let mut out = Vec::new();
        correlation_csv(&result.auto, &mut out).unwrap();
        let rows = lines(out);
        assert_eq!(rows[0], "key,frequency,re,im,norm_re,norm_im");
        // two stations, half length 8 → 3 bins each
        assert_eq!(rows.len(), 1 + 6);
        assert!(rows[1].starts_with("a,"));
    }
}
