use barolink::analysis::{remove_mean, CorrelationResult, ResultKey};
use barolink::data::model::Specifications;
use eframe::egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotPoints};

use crate::state::{AppState, View};

/// One named curve.
pub struct Series {
    pub key: String,
    pub points: Vec<[f64; 2]>,
}

// ---------------------------------------------------------------------------
// Series extraction
// ---------------------------------------------------------------------------

fn spectrum_series<K: ResultKey + ToString>(result: &CorrelationResult<K>, show_phase: bool) -> Vec<Series> {
    result
        .frequencies
        .iter()
        .map(|(key, frequencies)| {
            let values: Vec<f64> = if show_phase {
                result.correlation_norm[key].iter().map(|s| s.arg()).collect()
            } else {
                result.correlation[key].iter().map(|s| s.norm()).collect()
            };
            Series {
                key: key.to_string(),
                points: frequencies.iter().zip(values).map(|(&f, v)| [f, v]).collect(),
            }
        })
        .collect()
}

/// Curves of the current view, before any axis transform.
pub fn view_series(state: &AppState) -> Vec<Series> {
    let Some(selected) = &state.selected else {
        return Vec::new();
    };

    if state.view == View::Pressure {
        return selected
            .stations()
            .iter()
            .filter_map(|station| {
                let series = selected.data.get(station)?;
                let points = series
                    .times
                    .iter()
                    .zip(remove_mean(&series.pressures))
                    .map(|(&t, p)| [t, p])
                    .collect();
                Some(Series {
                    key: station.clone(),
                    points,
                })
            })
            .collect();
    }

    let Some(report) = &state.report else {
        return Vec::new();
    };
    match state.view {
        View::Pressure => Vec::new(),
        View::ExcessPathLength => report
            .excess
            .excess_path_length
            .iter()
            .map(|(pair, values)| Series {
                key: pair.key(),
                points: report.excess.times.iter().zip(values).map(|(&t, &v)| [t, v]).collect(),
            })
            .collect(),
        View::AllanVariance => report
            .allan
            .allan_var
            .keys()
            .map(|pair| Series {
                key: pair.key(),
                points: report.allan.valid_points(pair).into_iter().map(|(t, v)| [t, v]).collect(),
            })
            .collect(),
        View::CrossSpectrum => spectrum_series(&report.correlation.cross, state.show_phase),
        View::AutoSpectrum => spectrum_series(&report.correlation.auto, state.show_phase),
    }
}

/// log10 of each axis that is logarithmic; points that cannot be
/// represented are dropped.
fn to_log_axes(points: &[[f64; 2]], log_x: bool, log_y: bool) -> Vec<[f64; 2]> {
    points
        .iter()
        .filter(|[x, y]| (!log_x || *x > 0.0) && (!log_y || *y > 0.0))
        .map(|&[x, y]| {
            [
                if log_x { x.log10() } else { x },
                if log_y { y.log10() } else { y },
            ]
        })
        .collect()
}

fn unit(specs: &Specifications, quantity: &str) -> String {
    specs.units.get(quantity).cloned().unwrap_or_default()
}

fn axis_labels(state: &AppState) -> (String, String) {
    let Some(selected) = &state.selected else {
        return (String::new(), String::new());
    };
    let specs = &selected.specifications;
    let times = format!("Time ({})", unit(specs, "times"));
    let frequency = format!("Frequency ({})", state.config.frequency_units);
    let (x, y) = match state.view {
        View::Pressure => (times, format!("Pressure ({})", unit(specs, "pressures"))),
        View::ExcessPathLength => (times, format!("Excess path length ({})", state.config.l_norm_units)),
        View::AllanVariance => (
            format!("Averaging time ({})", unit(specs, "times")),
            format!("Allan variance ({})", state.config.allan_var_units),
        ),
        View::CrossSpectrum | View::AutoSpectrum if state.show_phase => (frequency, "Phase (rad)".to_string()),
        View::CrossSpectrum | View::AutoSpectrum => (frequency, "|Power|".to_string()),
    };
    if state.log_axes {
        (format!("log10 {x}"), format!("log10 {y}"))
    } else {
        (x, y)
    }
}

// ---------------------------------------------------------------------------
// Analysis plot (central panel)
// ---------------------------------------------------------------------------

/// Render the current view in the central panel.
pub fn analysis_plot(ui: &mut Ui, state: &AppState) {
    if state.collection.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a collection to analyse  (File → Open…)");
        });
        return;
    }

    let (x_label, y_label) = axis_labels(state);
    let log_x = state.log_axes;
    let log_y = state.log_axes && !(state.view.is_spectrum() && state.show_phase);
    let series = view_series(state);

    Plot::new("analysis_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for s in &series {
                let color = state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(&s.key))
                    .unwrap_or(Color32::LIGHT_BLUE);

                let points: PlotPoints = if state.log_axes {
                    to_log_axes(&s.points, log_x, log_y).into_iter().collect()
                } else {
                    s.points.iter().copied().collect()
                };

                let line = Line::new(points)
                    .name(&s.key)
                    .color(color)
                    .width(1.5);

                plot_ui.line(line);
            }
        });
}
