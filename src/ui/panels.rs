use std::fs::File;
use std::path::Path;

use anyhow::{bail, Result};
use barolink::data::legacy::{migrate, split_legacy_path, LegacyOptions};
use barolink::data::loader::{load_file, save_file};
use barolink::export;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Left side panel – specifications and station selection
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Collection");
    ui.separator();

    let collection = match &state.collection {
        Some(c) => c,
        None => {
            ui.label("No collection loaded.");
            return;
        }
    };

    // Clone what we need so we can mutate state below.
    let specs = collection.specifications.clone();
    let samples = collection.sample_count();

    let mut rows: Vec<(String, String)> = vec![
        ("Filter".to_string(), specs.filter_number.to_string()),
        ("Sampling".to_string(), format!("{} Hz", specs.sampling_frequency)),
        ("Samples".to_string(), samples.to_string()),
    ];
    rows.extend(
        specs
            .units
            .iter()
            .map(|(quantity, unit)| (format!("Unit: {quantity}"), unit.clone())),
    );

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .column(Column::remainder())
        .body(|mut body| {
            for (name, value) in &rows {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.strong(name);
                    });
                    row.col(|ui| {
                        ui.label(value);
                    });
                });
            }
        });

    ui.add_space(8.0);
    ui.heading("Stations");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // Select all / none buttons
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all();
                }
                if ui.small_button("None").clicked() {
                    state.select_none();
                }
            });

            let n_selected = state.filters.len();
            ui.label(format!("{n_selected}/{} selected", specs.stations.len()));

            let mut toggled = None;
            for station in &specs.stations {
                let mut text = RichText::new(station);
                if let Some(cm) = &state.color_map {
                    text = text.color(cm.color_for(station));
                }

                let mut checked = state.filters.contains(station);
                if ui.checkbox(&mut checked, text).changed() {
                    toggled = Some(station.clone());
                }
            }
            if let Some(station) = toggled {
                state.toggle_station(&station);
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Migrate legacy collection…").clicked() {
                migrate_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Save as…").clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export view as CSV…").clicked() {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for view in View::ALL {
            if ui.selectable_label(state.view == view, view.label()).clicked() {
                state.view = view;
            }
        }

        ui.separator();

        if ui.selectable_label(state.log_axes, "Log axes").clicked() {
            state.log_axes = !state.log_axes;
        }
        if state.view.is_spectrum() && ui.selectable_label(state.show_phase, "Phase").clicked() {
            state.show_phase = !state.show_phase;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn report_result(state: &mut AppState, what: &str, result: Result<()>) {
    match result {
        Ok(()) => state.status_message = None,
        Err(e) => {
            log::error!("Failed to {what}: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open pressure collection")
        .add_filter("Supported files", &["parquet", "pq", "json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match load_file(&path) {
            Ok(collection) => state.set_collection(collection),
            Err(e) => report_result(state, "load file", Err(e)),
        }
    }
}

/// Pick any one of the four legacy station files.
pub fn migrate_dialog(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Pick a legacy station file (dolphin_/otter_/seal_/orca_…)")
        .pick_file()
    else {
        return;
    };

    let result = match split_legacy_path(&path) {
        Some((dir, name)) => migrate(&dir, &name, &LegacyOptions::default()),
        None => Err(anyhow::anyhow!("{} is not a legacy station file", path.display())),
    };
    match result {
        Ok(collection) => state.set_collection(collection),
        Err(e) => report_result(state, "migrate legacy collection", Err(e)),
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let Some(collection) = &state.collection else {
        return;
    };
    let Some(path) = rfd::FileDialog::new()
        .set_title("Save collection")
        .add_filter("Parquet", &["parquet"])
        .add_filter("JSON", &["json"])
        .set_file_name("collection.parquet")
        .save_file()
    else {
        return;
    };
    let result = save_file(collection, &path);
    report_result(state, "save collection", result);
}

fn export_view(state: &AppState, path: &Path) -> Result<()> {
    let Some(report) = &state.report else {
        bail!("no analysis to export");
    };
    let file = File::create(path)?;
    match state.view {
        View::Pressure => bail!("select an analysis view to export"),
        View::ExcessPathLength => export::excess_csv(&report.excess, file),
        View::AllanVariance => export::allan_csv(&report.allan, file),
        View::CrossSpectrum => export::correlation_csv(&report.correlation.cross, file),
        View::AutoSpectrum => export::correlation_csv(&report.correlation.auto, file),
    }
}

pub fn export_dialog(state: &mut AppState) {
    if state.report.is_none() {
        return;
    }
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export current view")
        .add_filter("CSV", &["csv"])
        .set_file_name("analysis.csv")
        .save_file()
    else {
        return;
    };
    let result = export_view(state, &path);
    report_result(state, "export CSV", result);
}
