//! Migration from the pre-2024 layout: one file per station, each holding
//! a single series keyed by the filter setting it was recorded with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::model::{DataCollection, FilterNumber, Specifications, StationSeries, Units};

/// File prefixes of the legacy layout, in station order.
pub const LEGACY_PREFIXES: [&str; 4] = ["dolphin", "otter", "seal", "orca"];

/// One legacy station file: filter key (e.g. `b'IA=3'`) → series.
pub type LegacyStationFile = BTreeMap<String, StationSeries>;

/// Parameters the legacy files do not carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyOptions {
    /// Names assigned to the legacy files, in [`LEGACY_PREFIXES`] order.
    pub station_names: Vec<String>,
    pub pressure_units: String,
    pub time_units: String,
    pub sampling_frequency: f64,
}

impl Default for LegacyOptions {
    fn default() -> Self {
        Self {
            station_names: ["dol", "ott", "sea", "orc"].map(String::from).to_vec(),
            pressure_units: "bar".to_string(),
            time_units: "sec".to_string(),
            sampling_frequency: 625.0,
        }
    }
}

/// Path of one station's legacy file.
pub fn legacy_path(dir: &Path, prefix: &str, collection_name: &str) -> PathBuf {
    dir.join(format!("{prefix}_{collection_name}"))
}

/// Recover `(directory, collection name)` from the path of any legacy file.
pub fn split_legacy_path(path: &Path) -> Option<(PathBuf, String)> {
    let file_name = path.file_name()?.to_str()?;
    let name = LEGACY_PREFIXES
        .iter()
        .find_map(|prefix| file_name.strip_prefix(prefix)?.strip_prefix('_'))?;
    if name.is_empty() {
        return None;
    }
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Some((dir, name.to_string()))
}

/// Read the four legacy station files of a collection, in prefix order.
pub fn load_legacy(dir: &Path, collection_name: &str) -> Result<Vec<LegacyStationFile>> {
    LEGACY_PREFIXES
        .iter()
        .map(|prefix| {
            let path = legacy_path(dir, prefix, collection_name);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading legacy file {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing legacy file {}", path.display()))
        })
        .collect()
}

/// Filter setting embedded in the first legacy file's key.
pub fn legacy_filter_number(files: &[LegacyStationFile]) -> Result<FilterNumber> {
    let first = files.first().context("no legacy station files")?;
    let keys = first.keys().cloned().collect::<Vec<_>>().join(", ");
    Ok(FilterNumber::find_in(&keys)?)
}

fn series_for(file: &LegacyStationFile, filter: FilterNumber) -> Option<&StationSeries> {
    file.iter()
        .find(|(key, _)| FilterNumber::find_in(key).ok() == Some(filter))
        .map(|(_, series)| series)
}

/// Build a standard collection from loaded legacy files. The idx-th file
/// becomes station `options.station_names[idx]`.
pub fn reformat(files: Vec<LegacyStationFile>, options: &LegacyOptions) -> Result<DataCollection> {
    if files.len() != options.station_names.len() {
        bail!(
            "{} legacy files but {} station names",
            files.len(),
            options.station_names.len()
        );
    }
    let filter = legacy_filter_number(&files)?;

    let mut data = BTreeMap::new();
    for (name, file) in options.station_names.iter().zip(&files) {
        let series = series_for(file, filter).with_context(|| format!("station '{name}' has no {filter} series"))?;
        data.insert(name.clone(), series.clone());
    }

    let specifications = Specifications {
        stations: options.station_names.clone(),
        sampling_frequency: options.sampling_frequency,
        filter_number: filter,
        units: Units::from([
            ("pressures".to_string(), options.pressure_units.clone()),
            ("times".to_string(), options.time_units.clone()),
        ]),
    };
    Ok(DataCollection::new(specifications, data)?)
}

/// Load and reformat a legacy collection.
pub fn migrate(dir: &Path, collection_name: &str, options: &LegacyOptions) -> Result<DataCollection> {
    let files = load_legacy(dir, collection_name)?;
    let collection = reformat(files, options)?;
    log::info!(
        "Migrated legacy collection '{collection_name}' ({}, {} stations)",
        collection.specifications.filter_number,
        collection.stations().len()
    );
    Ok(collection)
}

/// Write a collection in the legacy layout, one file per station.
pub fn write_legacy(collection: &DataCollection, dir: &Path, collection_name: &str) -> Result<()> {
    if collection.stations().len() != LEGACY_PREFIXES.len() {
        bail!(
            "legacy layout holds exactly {} stations, got {}",
            LEGACY_PREFIXES.len(),
            collection.stations().len()
        );
    }
    let key = format!("b'{}'", collection.specifications.filter_number);
    for (prefix, station) in LEGACY_PREFIXES.iter().zip(collection.stations()) {
        let file: LegacyStationFile = BTreeMap::from([(key.clone(), collection.series(station)?.clone())]);
        let path = legacy_path(dir, prefix, collection_name);
        let text = serde_json::to_string(&file).context("serializing legacy file")?;
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
