use eframe::egui;

use crate::config::ViewerConfig;
use crate::data::model::GeoPoint;
use crate::data::store::DatasetStore;
use crate::presenter::{self, ClickOutcome, Surfaces, TextPanel};
use crate::ui::chart::NdviChart;
use crate::ui::map::SlippyMap;
use crate::ui::panels::{AlertBox, PredictionPanel};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state.
pub struct AppState {
    pub config: ViewerConfig,

    /// Session dataset (loaded once in the background).
    pub store: DatasetStore,

    pub map: SlippyMap,
    pub chart: NdviChart,

    /// Prediction text; `None` hides the panel and its updates.
    pub panel: Option<PredictionPanel>,

    /// Pending user-visible warning.
    pub alert: AlertBox,

    /// Index of the location picked by the last successful click.
    pub selected: Option<usize>,

    /// Scroll the page to the map on the next frame.
    pub scroll_to_map: bool,
}

impl AppState {
    /// Build the widgets and kick off the dataset load.
    pub fn new(config: ViewerConfig, ctx: &egui::Context) -> Self {
        let mut store = DatasetStore::default();
        let repaint = ctx.clone();
        store.load(&config.dataset_source, move || repaint.request_repaint());

        Self {
            map: SlippyMap::new(&config, ctx),
            chart: NdviChart::new(Some(ctx.clone())),
            panel: Some(PredictionPanel::default()),
            alert: AlertBox::default(),
            selected: None,
            scroll_to_map: false,
            store,
            config,
        }
    }

    /// Route a map click through the presenter. Ignored while a warning is
    /// still on screen.
    pub fn on_map_click(&mut self, point: GeoPoint) {
        if self.alert.is_open() {
            log::debug!("Click at {point} ignored: warning still open");
            return;
        }
        let outcome = presenter::handle_click(
            point,
            self.store.get(),
            Surfaces {
                map: &mut self.map,
                chart: &mut self.chart,
                panel: self.panel.as_mut().map(|p| p as &mut dyn TextPanel),
                notifier: &mut self.alert,
            },
        );
        if let ClickOutcome::Selected { index, .. } = outcome {
            self.selected = Some(index);
        }
    }
}
