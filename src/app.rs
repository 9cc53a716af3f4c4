use eframe::egui;

use crate::config::ViewerConfig;
use crate::state::AppState;
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct BloomApp {
    pub state: AppState,
}

impl BloomApp {
    pub fn new(config: ViewerConfig, ctx: &egui::Context) -> Self {
        Self {
            state: AppState::new(config, ctx),
        }
    }
}

impl eframe::App for BloomApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.store.poll();

        // ---- Top panel: load status ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state);
        });

        // ---- Left side panel: prediction + legend ----
        egui::SidePanel::left("prediction_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state);
            });

        // ---- Central panel: hero, map, chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if panels::hero(ui) {
                        self.state.scroll_to_map = true;
                    }

                    let scroll_here = std::mem::take(&mut self.state.scroll_to_map);
                    panels::section_heading(ui, "Map", scroll_here);
                    let state = &mut self.state;
                    let clicked = state.map.show(ui, state.store.get().ok());
                    if let Some(point) = clicked {
                        state.on_map_click(point);
                    }

                    ui.add_space(16.0);
                    panels::section_heading(ui, "NDVI trend", false);
                    self.state.chart.show(ui);
                });
        });

        self.state.alert.show(ctx);
    }
}
