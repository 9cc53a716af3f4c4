use eframe::egui::{self, Align, Color32, RichText, Ui};

use crate::color::{legend_entries, ndvi_color};
use crate::data::store::LoadState;
use crate::presenter::{Notifier, PanelText, TextPanel};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Prediction text panel
// ---------------------------------------------------------------------------

/// Side-panel text showing the latest prediction.
#[derive(Debug, Default)]
pub struct PredictionPanel {
    text: Option<PanelText>,
}

impl PredictionPanel {
    #[cfg(test)]
    pub fn text(&self) -> Option<&PanelText> {
        self.text.as_ref()
    }

    pub fn show(&self, ui: &mut Ui) {
        ui.heading("Prediction");
        ui.separator();
        match &self.text {
            Some(text) => {
                ui.horizontal_wrapped(|ui: &mut Ui| {
                    ui.label(format!("Predicted Bloom Index at ({}, {}):", text.lat, text.lon));
                    let color = if text.prediction.is_bloom() {
                        Color32::from_rgb(0xc2, 0x3b, 0x7a)
                    } else {
                        Color32::from_rgb(0x8b, 0x5a, 0x2b)
                    };
                    ui.label(RichText::new(text.prediction.to_string()).strong().color(color));
                });
            }
            None => {
                ui.label("Click anywhere on the map to predict a bloom.");
            }
        }
    }
}

impl TextPanel for PredictionPanel {
    fn set_text(&mut self, text: PanelText) {
        self.text = Some(text);
    }
}

// ---------------------------------------------------------------------------
// Blocking alert
// ---------------------------------------------------------------------------

/// A modal warning that blocks the page until dismissed.
#[derive(Debug, Default)]
pub struct AlertBox {
    message: Option<String>,
}

impl AlertBox {
    #[cfg(test)]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.message.is_some()
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let Some(message) = &self.message else {
            return;
        };
        let modal = egui::Modal::new(egui::Id::new("not_ready_alert")).show(ctx, |ui: &mut Ui| {
            ui.set_max_width(320.0);
            ui.heading("Warning");
            ui.label(message);
            ui.add_space(6.0);
            ui.vertical_centered(|ui: &mut Ui| ui.button("OK").clicked()).inner
        });
        if modal.inner || modal.should_close() {
            self.message = None;
        }
    }
}

impl Notifier for AlertBox {
    fn warn(&mut self, message: String) {
        self.message = Some(message);
    }
}

// ---------------------------------------------------------------------------
// Left side panel
// ---------------------------------------------------------------------------

/// Render the side panel: prediction text, dataset summary and legend.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    if let Some(panel) = &state.panel {
        panel.show(ui);
        ui.add_space(12.0);
    }

    ui.heading("Dataset");
    ui.separator();
    ui.label(format!("Source: {}", state.config.dataset_source));
    match state.store.get() {
        Ok(ds) => {
            ui.label(format!("{} sample locations", ds.len()));
            ui.label(format!("Up to {} time steps", ds.max_series_len()));
            if let Some(i) = state.selected {
                if let Some(loc) = ds.locations.get(i) {
                    let peak = loc.peak_ndvi().unwrap_or(0.0);
                    ui.horizontal(|ui: &mut Ui| {
                        ui.label("Selected peak NDVI:");
                        ui.label(RichText::new(format!("{peak:.2}")).color(ndvi_color(peak)));
                    });
                }
            }
        }
        Err(_) => {
            ui.label("No dataset loaded.");
        }
    }

    ui.add_space(12.0);
    ui.strong("Peak NDVI");
    for (label, color) in legend_entries(5) {
        ui.horizontal(|ui: &mut Ui| {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
            ui.painter().circle_filled(rect.center(), 6.0, color);
            ui.label(label);
        });
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top bar with the dataset load status.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.strong("Bloomwatch");
        ui.separator();

        match state.store.state() {
            LoadState::Uninitialized => {
                ui.label("Dataset not requested");
            }
            LoadState::Loading { source_name } => {
                ui.spinner();
                ui.label(format!("Loading {source_name}…"));
            }
            LoadState::Ready(ds) => {
                ui.label(format!("{} locations loaded", ds.len()));
            }
            LoadState::Failed(e) => {
                ui.label(RichText::new(format!("Error: {e}")).color(Color32::RED));
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Hero header
// ---------------------------------------------------------------------------

/// Title block with the "Start Demo" button. Returns `true` when clicked.
pub fn hero(ui: &mut Ui) -> bool {
    let mut start = false;
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(24.0);
        ui.heading(RichText::new("Bloom prediction from NDVI").size(28.0));
        ui.label("Simulated vegetation index over the map. Click a location to chart its trend.");
        ui.add_space(12.0);
        start = ui.button(RichText::new("Start Demo").size(16.0)).clicked();
        ui.add_space(24.0);
    });
    start
}

/// Section heading that can pull itself into view.
pub fn section_heading(ui: &mut Ui, title: &str, scroll_here: bool) {
    let response = ui.heading(title);
    if scroll_here {
        response.scroll_to_me(Some(Align::TOP));
    }
    ui.separator();
}
