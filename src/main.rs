mod analysis;
mod app;
mod color;
mod config;
mod data;
mod error;
mod presenter;
mod state;
mod ui;

use std::path::Path;

use app::BloomApp;
use config::{CONFIG_FILE, ViewerConfig};
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ViewerConfig::load_or_default(Path::new(CONFIG_FILE));
    log::info!("Dataset source: {}", config.dataset_source);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Bloomwatch – NDVI Bloom Viewer",
        options,
        Box::new(|cc| Ok(Box::new(BloomApp::new(config, &cc.egui_ctx)))),
    )
}
