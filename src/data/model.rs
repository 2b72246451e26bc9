use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// FilterNumber – instrument configuration token
// ---------------------------------------------------------------------------

/// The barometer filter setting a collection was recorded with.
///
/// Stored and displayed as the token `IA=<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterNumber(pub u32);

impl FilterNumber {
    /// Fixed-format byte token, e.g. `b"IA=3"`.
    pub fn to_token(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Find an `IA=<int>` token anywhere in `text`.
    pub fn find_in(text: &str) -> Result<Self> {
        let start = text
            .find("IA=")
            .ok_or_else(|| Error::InvalidFilterToken(text.to_string()))?;
        let digits: String = text[start + 3..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits
            .parse::<u32>()
            .map(FilterNumber)
            .map_err(|_| Error::InvalidFilterToken(text.to_string()))
    }
}

impl fmt::Display for FilterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IA={}", self.0)
    }
}

impl FromStr for FilterNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FilterNumber::find_in(s)
    }
}

impl Serialize for FilterNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FilterNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Specifications – metadata shared by raw and derived collections
// ---------------------------------------------------------------------------

/// Quantity name → unit label. Descriptive only.
pub type Units = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specifications {
    /// Canonical station order; pairs are formed in this order.
    pub stations: Vec<String>,
    /// Samples per second.
    pub sampling_frequency: f64,
    pub filter_number: FilterNumber,
    #[serde(default)]
    pub units: Units,
}

impl Specifications {
    /// Look up a unit label, failing with `MissingSpecification` when absent.
    pub fn unit(&self, quantity: &str) -> Result<&str> {
        self.units
            .get(quantity)
            .map(String::as_str)
            .ok_or_else(|| Error::missing(format!("units.{quantity}")))
    }

    /// Deep copy with the `units` map replaced by `units`.
    pub fn with_units(&self, units: Units) -> Self {
        Specifications {
            units,
            ..self.clone()
        }
    }

    /// Station identifiers are opaque but must be unique and non-empty.
    pub fn validate_stations(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for station in &self.stations {
            if station.is_empty() {
                return Err(Error::InvalidStation(station.clone()));
            }
            if !seen.insert(station.as_str()) {
                return Err(Error::InvalidStation(format!("duplicate '{station}'")));
            }
        }
        Ok(())
    }

    pub fn validate_sampling_frequency(&self) -> Result<()> {
        if self.sampling_frequency.is_finite() && self.sampling_frequency > 0.0 {
            Ok(())
        } else {
            Err(Error::Configuration(format!(
                "sampling frequency must be positive, got {}",
                self.sampling_frequency
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// StationSeries – one station's samples
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationSeries {
    pub pressures: Vec<f64>,
    /// Monotonically increasing, same length as `pressures`.
    pub times: Vec<f64>,
}

impl StationSeries {
    pub fn len(&self) -> usize {
        self.pressures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DataCollection – the raw multi-station record
// ---------------------------------------------------------------------------

/// Simultaneous pressure recordings from several stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCollection {
    pub specifications: Specifications,
    pub data: BTreeMap<String, StationSeries>,
}

impl DataCollection {
    pub fn new(specifications: Specifications, data: BTreeMap<String, StationSeries>) -> Result<Self> {
        let collection = DataCollection {
            specifications,
            data,
        };
        collection.validate()?;
        Ok(collection)
    }

    /// The station list, in canonical order.
    pub fn stations(&self) -> &[String] {
        &self.specifications.stations
    }

    pub fn series(&self, station: &str) -> Result<&StationSeries> {
        self.data.get(station).ok_or_else(|| Error::MissingStation {
            station: station.to_string(),
        })
    }

    /// Shared sample count (0 for an empty station list).
    pub fn sample_count(&self) -> usize {
        self.stations()
            .first()
            .and_then(|s| self.data.get(s))
            .map_or(0, StationSeries::len)
    }

    /// Check the structural invariants: valid identifiers, every listed
    /// station has data, all series share one length with
    /// `times.len() == pressures.len()`, and times strictly increase.
    pub fn validate(&self) -> Result<()> {
        self.specifications.validate_stations()?;

        let mut expected: Option<usize> = None;
        for station in self.stations() {
            let series = self.series(station)?;
            let n = *expected.get_or_insert(series.pressures.len());
            for actual in [series.pressures.len(), series.times.len()] {
                if actual != n {
                    return Err(Error::MismatchedLength {
                        station: station.clone(),
                        expected: n,
                        actual,
                    });
                }
            }
            // Negated comparison so NaN timestamps are rejected too.
            if let Some(i) = series.times.windows(2).position(|w| !(w[1] > w[0])) {
                return Err(Error::NonMonotonicTimes {
                    station: station.clone(),
                    index: i + 1,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Collection with the given station names and pressure series; times
    /// are sampled at `sampling_frequency` from zero.
    pub(crate) fn collection(stations: &[&str], pressures: Vec<Vec<f64>>, sampling_frequency: f64) -> DataCollection {
        let mut data = BTreeMap::new();
        for (name, p) in stations.iter().zip(pressures) {
            let times = (0..p.len()).map(|i| i as f64 / sampling_frequency).collect();
            data.insert(name.to_string(), StationSeries { pressures: p, times });
        }
        let units = Units::from([
            ("pressures".to_string(), "bar".to_string()),
            ("times".to_string(), "sec".to_string()),
        ]);
        DataCollection::new(
            Specifications {
                stations: stations.iter().map(|s| s.to_string()).collect(),
                sampling_frequency,
                filter_number: FilterNumber(3),
                units,
            },
            data,
        )
        .unwrap()
    }

    #[test]
    fn test_filter_number_token() {
        let filter = FilterNumber(12);
        assert_eq!(filter.to_string(), "IA=12");
        assert_eq!(filter.to_token(), b"IA=12".to_vec());
        assert_eq!(FilterNumber::find_in("dict_keys([b'IA=7'])").unwrap(), FilterNumber(7));
        assert!(matches!(
            "IA=x".parse::<FilterNumber>(),
            Err(Error::InvalidFilterToken(_))
        ));
        assert!("no token".parse::<FilterNumber>().is_err());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let mut c = collection(&["a", "b"], vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]], 1.0);
        c.data.get_mut("b").unwrap().pressures.pop();
        assert_eq!(
            c.validate(),
            Err(Error::MismatchedLength {
                station: "b".to_string(),
                expected: 3,
                actual: 2
            })
        );

        let mut c = collection(&["a"], vec![vec![1.0, 2.0]], 1.0);
        c.data.get_mut("a").unwrap().times.push(9.0);
        assert!(matches!(c.validate(), Err(Error::MismatchedLength { .. })));
    }

    #[test]
    fn test_station_validation() {
        let mut c = collection(&["a", "b"], vec![vec![0.0], vec![0.0]], 1.0);
        c.specifications.stations.push("c".to_string());
        assert_eq!(
            c.validate(),
            Err(Error::MissingStation {
                station: "c".to_string()
            })
        );

        c.specifications.stations = vec![String::new()];
        assert!(matches!(c.validate(), Err(Error::InvalidStation(_))));

        c.specifications.stations = vec!["a".to_string(), "a".to_string()];
        assert!(matches!(c.validate(), Err(Error::InvalidStation(_))));
    }

    #[test]
    fn test_hyphenated_station_ids_accepted() {
        let c = collection(&["north-1", "south-2", "a-b-c"], vec![vec![0.0; 4]; 3], 1.0);
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn test_times_must_increase() {
        let mut data = BTreeMap::new();
        data.insert(
            "a".to_string(),
            StationSeries {
                pressures: vec![1.0, 2.0, 3.0, 4.0],
                times: vec![3.0, 1.0, 2.0, 0.0],
            },
        );
        let specs = collection(&["a"], vec![vec![0.0]], 1.0).specifications;
        assert_eq!(
            DataCollection::new(specs, data),
            Err(Error::NonMonotonicTimes {
                station: "a".to_string(),
                index: 1
            })
        );

        let mut c = collection(&["a", "b"], vec![vec![0.0; 4]; 2], 1.0);
        c.data.get_mut("b").unwrap().times[2] = 1.0;
        assert_eq!(
            c.validate(),
            Err(Error::NonMonotonicTimes {
                station: "b".to_string(),
                index: 2
            })
        );

        c.data.get_mut("b").unwrap().times[2] = f64::NAN;
        assert!(matches!(c.validate(), Err(Error::NonMonotonicTimes { .. })));
    }

    #[test]
    fn test_unit_lookup() {
        let c = collection(&["a"], vec![vec![0.0]], 1.0);
        assert_eq!(c.specifications.unit("pressures").unwrap(), "bar");
        assert_eq!(
            c.specifications.unit("frequency"),
            Err(Error::MissingSpecification {
                field: "units.frequency".to_string()
            })
        );
    }

    #[test]
    fn test_json_shape() {
        let c = collection(&["a"], vec![vec![1.5]], 625.0);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["specifications"]["filter_number"], "IA=3");
        assert_eq!(json["data"]["a"]["pressures"][0], 1.5);
    }
}
