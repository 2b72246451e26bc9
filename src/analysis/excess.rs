use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pairs::{index_pairs, StationPair};
use super::remove_mean;
use crate::config::AnalysisConfig;
use crate::data::model::{DataCollection, Specifications, Units};
use crate::error::Result;

/// Pairwise excess path length series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcessPathLengthResult {
    /// Copy of the input specifications with `L_norm`/`p_norm` units added.
    pub specifications: Specifications,
    /// Time axis of the first station, shared by every pair.
    pub times: Vec<f64>,
    #[serde(with = "crate::analysis::pairs::keyed")]
    pub excess_path_length: BTreeMap<StationPair, Vec<f64>>,
}

/// Compute `(p_i - mean(p_i) - p_j + mean(p_j)) * L_norm / p_norm` for
/// every canonical pair `i < j`.
///
/// Fewer than two stations yields an empty pair map.
pub fn excess_path_length(collection: &DataCollection, config: &AnalysisConfig) -> Result<ExcessPathLengthResult> {
    config.validate()?;
    let specs = &collection.specifications;
    let times_unit = specs.unit("times")?;
    let pressures_unit = specs.unit("pressures")?;
    collection.validate()?;

    let stations = collection.stations();
    log::info!(
        "Computing excess path length for {} stations ({} pairs)",
        stations.len(),
        stations.len() * stations.len().saturating_sub(1) / 2
    );

    let centered = stations
        .iter()
        .map(|s| Ok(remove_mean(&collection.series(s)?.pressures)))
        .collect::<Result<Vec<_>>>()?;

    let scale = config.scale();
    let mut excess = BTreeMap::new();
    for (i, j) in index_pairs(stations.len()) {
        let pair = StationPair::new(stations[i].clone(), stations[j].clone());
        log::debug!("excess path length for {pair}");
        let series = centered[i]
            .iter()
            .zip(&centered[j])
            .map(|(a, b)| (a - b) * scale)
            .collect();
        excess.insert(pair, series);
    }

    let times = match stations.first() {
        Some(first) => collection.series(first)?.times.clone(),
        None => Vec::new(),
    };

    let units = Units::from([
        ("L_norm".to_string(), config.l_norm_units.clone()),
        ("p_norm".to_string(), config.p_norm_units.clone()),
        ("times".to_string(), times_unit.to_string()),
        ("pressures".to_string(), pressures_unit.to_string()),
    ]);

    Ok(ExcessPathLengthResult {
        specifications: specs.with_units(units),
        times,
        excess_path_length: excess,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::collection;
    use crate::error::Error;
    use std::f64::consts::PI;

    #[test]
    fn test_pair_keys() {
        let c = collection(
            &["a", "b", "c", "d"],
            vec![vec![1.0, 2.0], vec![0.0, 4.0], vec![3.0, 3.0], vec![5.0, -1.0]],
            1.0,
        );
        let result = excess_path_length(&c, &AnalysisConfig::default()).unwrap();
        let keys: Vec<String> = result.excess_path_length.keys().map(StationPair::key).collect();
        assert_eq!(keys, ["a-b", "a-c", "a-d", "b-c", "b-d", "c-d"]);
        assert_eq!(result.times, c.data["a"].times);
    }

    #[test]
    fn test_antisymmetric_under_swap() {
        let p1 = vec![1.0, 4.0, 2.0, 8.0];
        let p2 = vec![0.5, -3.0, 7.0, 1.0];
        let config = AnalysisConfig::default();
        let forward = excess_path_length(&collection(&["a", "b"], vec![p1.clone(), p2.clone()], 1.0), &config).unwrap();
        let reverse = excess_path_length(&collection(&["b", "a"], vec![p2, p1], 1.0), &config).unwrap();

        let ab = &forward.excess_path_length[&StationPair::new("a", "b")];
        let ba = &reverse.excess_path_length[&StationPair::new("b", "a")];
        for (x, y) in ab.iter().zip(ba) {
            assert!((x + y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_offset_cancels() {
        let t: Vec<f64> = (0..200).map(|i| i as f64 * 0.05).collect();
        let a: Vec<f64> = t.iter().map(|t| (2.0 * PI * 0.1 * t).sin()).collect();
        let b: Vec<f64> = a.iter().map(|v| v + 3.7).collect();
        let c = collection(&["a", "b"], vec![a, b], 20.0);

        for (l_norm, p_norm) in [(2000.0, 1.0), (1.0, 0.25), (12.5, 40.0)] {
            let config = AnalysisConfig {
                l_norm,
                p_norm,
                ..Default::default()
            };
            let result = excess_path_length(&c, &config).unwrap();
            let series = &result.excess_path_length[&StationPair::new("a", "b")];
            assert!(series.iter().all(|v| v.abs() < 1e-9));
        }
    }

    #[test]
    fn test_scaling() {
        let c = collection(&["a", "b"], vec![vec![1.0, -1.0], vec![0.0, 0.0]], 1.0);
        let config = AnalysisConfig {
            l_norm: 10.0,
            p_norm: 2.0,
            ..Default::default()
        };
        let result = excess_path_length(&c, &config).unwrap();
        assert_eq!(result.excess_path_length[&StationPair::new("a", "b")], vec![5.0, -5.0]);
    }

    #[test]
    fn test_single_station_is_empty() {
        let c = collection(&["a"], vec![vec![1.0, 2.0, 3.0]], 1.0);
        let result = excess_path_length(&c, &AnalysisConfig::default()).unwrap();
        assert!(result.excess_path_length.is_empty());
        assert_eq!(result.times.len(), 3);
    }

    #[test]
    fn test_units_copied_not_aliased() {
        let c = collection(&["a", "b"], vec![vec![1.0], vec![2.0]], 1.0);
        let before = c.clone();
        let result = excess_path_length(&c, &AnalysisConfig::default()).unwrap();
        assert_eq!(c, before);
        assert_eq!(result.specifications.units["L_norm"], "mm");
        assert_eq!(result.specifications.units["p_norm"], "bar");
        assert_eq!(result.specifications.units["times"], "sec");
        assert!(!c.specifications.units.contains_key("L_norm"));
    }

    #[test]
    fn test_errors() {
        let mut c = collection(&["a", "b"], vec![vec![1.0, 2.0], vec![2.0, 3.0]], 1.0);
        let bad = AnalysisConfig {
            p_norm: 0.0,
            ..Default::default()
        };
        assert!(matches!(excess_path_length(&c, &bad), Err(Error::Configuration(_))));

        c.data.get_mut("b").unwrap().pressures.push(1.0);
        assert!(matches!(
            excess_path_length(&c, &AnalysisConfig::default()),
            Err(Error::MismatchedLength { .. })
        ));

        c.specifications.units.remove("times");
        assert_eq!(
            excess_path_length(&c, &AnalysisConfig::default()),
            Err(Error::MissingSpecification {
                field: "units.times".to_string()
            })
        );
    }
}
