mod app;
mod color;
mod state;
mod ui;

use std::path::Path;

use app::BarolinkApp;
use barolink::config::AnalysisConfig;
use eframe::egui;

/// Optional analysis parameters next to the working directory.
const CONFIG_FILE: &str = "barolink.json";

fn load_config() -> AnalysisConfig {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        return AnalysisConfig::default();
    }
    match AnalysisConfig::load(path) {
        Ok(config) => {
            log::info!("Loaded analysis config from {CONFIG_FILE}");
            config
        }
        Err(e) => {
            log::error!("Ignoring {CONFIG_FILE}: {e:#}");
            AnalysisConfig::default()
        }
    }
}

fn main() -> eframe::Result {
    env_logger::init();
    let config = load_config();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Barolink – Pressure Link Analysis",
        options,
        Box::new(|_cc| Ok(Box::new(BarolinkApp::new(config)))),
    )
}
