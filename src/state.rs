use barolink::analysis::{self, Report};
use barolink::config::AnalysisConfig;
use barolink::data::filter::{init_filter_state, select_stations, FilterState};
use barolink::data::model::DataCollection;

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Pressure,
    ExcessPathLength,
    AllanVariance,
    CrossSpectrum,
    AutoSpectrum,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Pressure,
        View::ExcessPathLength,
        View::AllanVariance,
        View::CrossSpectrum,
        View::AutoSpectrum,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            View::Pressure => "Pressure",
            View::ExcessPathLength => "Excess path length",
            View::AllanVariance => "Allan variance",
            View::CrossSpectrum => "Cross spectra",
            View::AutoSpectrum => "Auto spectra",
        }
    }

    pub fn is_spectrum(&self) -> bool {
        matches!(self, View::CrossSpectrum | View::AutoSpectrum)
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded collection (None until user loads a file).
    pub collection: Option<DataCollection>,

    /// Loaded collection restricted to the selected stations.
    pub selected: Option<DataCollection>,

    /// Selected stations.
    pub filters: FilterState,

    /// Analysis of `selected`.
    pub report: Option<Report>,

    pub config: AnalysisConfig,

    pub view: View,

    /// Plot log10 of both axes.
    pub log_axes: bool,

    /// Plot the phase of the normalized spectrum instead of the power
    /// magnitude.
    pub show_phase: bool,

    /// One colour per station and station pair.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            collection: None,
            selected: None,
            filters: FilterState::default(),
            report: None,
            config,
            view: View::Pressure,
            log_axes: false,
            show_phase: false,
            color_map: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded collection, select every station and analyse.
    pub fn set_collection(&mut self, collection: DataCollection) {
        self.filters = init_filter_state(&collection);
        self.color_map = Some(ColorMap::for_stations(collection.stations()));
        self.collection = Some(collection);
        self.status_message = None;
        self.reanalyze();
    }

    /// Recompute `selected` and `report` after a filter change.
    pub fn reanalyze(&mut self) {
        let Some(collection) = &self.collection else {
            return;
        };
        let selected = select_stations(collection, &self.filters);
        match analysis::run(&selected, &self.config) {
            Ok(report) => {
                log::info!(
                    "Analysed {} stations, {} pairs",
                    selected.stations().len(),
                    report.excess.excess_path_length.len()
                );
                self.report = Some(report);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Analysis failed: {e}");
                self.report = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
        self.selected = Some(selected);
    }

    /// Toggle a single station.
    pub fn toggle_station(&mut self, station: &str) {
        if !self.filters.remove(station) {
            self.filters.insert(station.to_string());
        }
        self.reanalyze();
    }

    /// Select all stations.
    pub fn select_all(&mut self) {
        if let Some(collection) = &self.collection {
            self.filters = init_filter_state(collection);
            self.reanalyze();
        }
    }

    /// Deselect all stations.
    pub fn select_none(&mut self) {
        self.filters.clear();
        self.reanalyze();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use barolink::{FilterNumber, Specifications, StationSeries, Units};

    use super::*;

    fn collection(stations: &[&str]) -> DataCollection {
        let data: BTreeMap<String, StationSeries> = stations
            .iter()
            .enumerate()
            .map(|(k, s)| {
                let series = StationSeries {
                    pressures: (0..16).map(|i| ((i * (k + 2)) as f64 * 0.3).sin()).collect(),
                    times: (0..16).map(|i| i as f64 * 0.1).collect(),
                };
                (s.to_string(), series)
            })
            .collect();
        let specifications = Specifications {
            stations: stations.iter().map(|s| s.to_string()).collect(),
            sampling_frequency: 10.0,
            filter_number: FilterNumber(1),
            units: Units::from([
                ("pressures".to_string(), "bar".to_string()),
                ("times".to_string(), "sec".to_string()),
            ]),
        };
        DataCollection::new(specifications, data).unwrap()
    }

    #[test]
    fn test_set_collection_analyses_every_station() {
        let mut state = AppState::new(AnalysisConfig::default());
        state.status_message = Some("Error: stale".to_string());
        state.set_collection(collection(&["north-1", "south-2", "east-3"]));

        assert!(state.status_message.is_none());
        assert_eq!(state.filters.len(), 3);
        let report = state.report.as_ref().unwrap();
        assert_eq!(report.excess.excess_path_length.len(), 3);

        state.toggle_station("south-2");
        assert_eq!(state.selected.as_ref().unwrap().stations(), ["north-1", "east-3"]);
        assert_eq!(state.report.as_ref().unwrap().excess.excess_path_length.len(), 1);

        state.select_none();
        assert!(state.report.as_ref().unwrap().excess.excess_path_length.is_empty());
    }
}
