use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unordered station pair, keyed with the canonically first station first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationPair {
    pub first: String,
    pub second: String,
}

impl StationPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        StationPair {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Display key `"{first}-{second}"`, for labels and CSV only.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StationPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

// ---------------------------------------------------------------------------
// Keyed result maps
// ---------------------------------------------------------------------------

/// Key type of a derived-result map, with its on-disk entry layout.
///
/// Pair-keyed maps are written as `[{first, second, values}]` entries so
/// station identifiers never need to be split apart again.
pub trait ResultKey: Ord + Clone + Sized {
    fn serialize_entries<V, S>(map: &BTreeMap<Self, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer;

    fn deserialize_entries<'de, V, D>(deserializer: D) -> Result<BTreeMap<Self, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>;
}

#[derive(Serialize)]
struct PairEntryRef<'a, V> {
    first: &'a str,
    second: &'a str,
    values: &'a V,
}

#[derive(Deserialize)]
struct PairEntry<V> {
    first: String,
    second: String,
    values: V,
}

impl ResultKey for StationPair {
    fn serialize_entries<V, S>(map: &BTreeMap<Self, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter().map(|(pair, values)| PairEntryRef {
            first: &pair.first,
            second: &pair.second,
            values,
        }))
    }

    fn deserialize_entries<'de, V, D>(deserializer: D) -> Result<BTreeMap<Self, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let entries = Vec::<PairEntry<V>>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|e| (StationPair::new(e.first, e.second), e.values))
            .collect())
    }
}

impl ResultKey for String {
    fn serialize_entries<V, S>(map: &BTreeMap<Self, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        map.serialize(serializer)
    }

    fn deserialize_entries<'de, V, D>(deserializer: D) -> Result<BTreeMap<Self, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        BTreeMap::deserialize(deserializer)
    }
}

/// `#[serde(with = "keyed")]` adapter for maps keyed by a [`ResultKey`].
pub mod keyed {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::ResultKey;

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: ResultKey,
        V: Serialize,
        S: Serializer,
    {
        K::serialize_entries(map, serializer)
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: ResultKey,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        K::deserialize_entries(deserializer)
    }
}

/// All index pairs `(i, j)` with `i < j < n`, in lexicographic order.
pub fn index_pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

/// Canonical station pairs of an ordered station list.
pub fn station_pairs(stations: &[String]) -> Vec<StationPair> {
    index_pairs(stations.len())
        .map(|(i, j)| StationPair::new(stations[i].clone(), stations[j].clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pair_count_is_n_choose_2() {
        for n in 0..8 {
            assert_eq!(index_pairs(n).count(), n * n.saturating_sub(1) / 2);
        }
    }

    #[test]
    fn test_pairs_follow_station_order() {
        let pairs = station_pairs(&names(&["orc", "dol", "sea"]));
        let keys: Vec<String> = pairs.iter().map(StationPair::key).collect();
        assert_eq!(keys, ["orc-dol", "orc-sea", "dol-sea"]);
    }

    #[test]
    fn test_pair_map_entries_keep_hyphenated_ids() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "keyed")]
            map: BTreeMap<StationPair, Vec<f64>>,
        }

        let pair = StationPair::new("north-1", "south-2");
        assert_eq!(pair.key(), "north-1-south-2");

        let wrapper = Wrapper {
            map: BTreeMap::from([(pair.clone(), vec![1.5, -2.0]), (StationPair::new("a", "b-c"), vec![])]),
        };
        let json = serde_json::to_value(&wrapper).unwrap();
        assert_eq!(json["map"][1]["first"], "north-1");
        assert_eq!(json["map"][1]["second"], "south-2");
        assert_eq!(json["map"][1]["values"][0], 1.5);

        let back: Wrapper = serde_json::from_value(json).unwrap();
        assert_eq!(back, wrapper);
    }

    #[test]
    fn test_station_keyed_map_stays_an_object() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "keyed")]
            map: BTreeMap<String, Vec<f64>>,
        }

        let wrapper = Wrapper {
            map: BTreeMap::from([("dol-1".to_string(), vec![2.0])]),
        };
        let json = serde_json::to_value(&wrapper).unwrap();
        assert_eq!(json["map"]["dol-1"][0], 2.0);
        assert_eq!(serde_json::from_value::<Wrapper>(json).unwrap(), wrapper);
    }
}
