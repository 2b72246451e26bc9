use std::collections::{BTreeMap, BTreeSet};

use super::model::DataCollection;

/// Selected station identifiers. Stations absent from the set are dropped.
pub type FilterState = BTreeSet<String>;

/// Initialise a [`FilterState`] with every station selected.
pub fn init_filter_state(collection: &DataCollection) -> FilterState {
    collection.stations().iter().cloned().collect()
}

/// Return a new collection restricted to the selected stations.
///
/// The canonical station order of the input is preserved, so pair keys of
/// the subset match the pair keys of the full collection.
pub fn select_stations(collection: &DataCollection, selected: &FilterState) -> DataCollection {
    let mut specifications = collection.specifications.clone();
    specifications.stations.retain(|s| selected.contains(s));

    let data: BTreeMap<_, _> = collection
        .data
        .iter()
        .filter(|(station, _)| specifications.stations.contains(station))
        .map(|(station, series)| (station.clone(), series.clone()))
        .collect();

    DataCollection {
        specifications,
        data,
    }
}
