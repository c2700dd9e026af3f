//! HealthScope - Health Survey Dashboard & Indicator Explorer
//!
//! Loads a health survey indicator table and renders interactive state
//! rankings, round-over-round comparisons, a map view and an indicator
//! correlation heatmap.

mod charts;
mod data;
mod geo;
mod gui;
mod stats;

use eframe::egui;
use gui::HealthScopeApp;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("HealthScope"),
        ..Default::default()
    };

    eframe::run_native(
        "HealthScope",
        options,
        Box::new(|cc| Ok(Box::new(HealthScopeApp::new(cc)))),
    )
}
