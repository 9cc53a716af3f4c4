use std::fmt;

use crate::analysis::bloom::{self, PredictionResult};
use crate::analysis::nearest;
use crate::data::model::{Dataset, GeoPoint, LocationRecord};
use crate::error::NotReady;

// ---------------------------------------------------------------------------
// Capabilities the click handler drives
// ---------------------------------------------------------------------------

pub trait MapWidget {
    /// Open a popup anchored at `at`, replacing any open popup.
    fn show_popup(&mut self, at: GeoPoint, content: PopupContent);

    /// Highlight the record at `index`. Optional.
    fn highlight(&mut self, _index: usize) {}
}

pub trait ChartWidget {
    fn replace_series(&mut self, series: &[f64]);
    fn redraw(&mut self);
}

pub trait TextPanel {
    fn set_text(&mut self, text: PanelText);
}

/// User-visible blocking alert.
pub trait Notifier {
    fn warn(&mut self, message: String);
}

/// Popup body: a bold headline followed by one detail line.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub headline: String,
    pub detail: String,
}

/// Text shown in the prediction panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelText {
    pub lat: f64,
    pub lon: f64,
    pub prediction: PredictionResult,
}

impl fmt::Display for PanelText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Predicted Bloom Index at ({}, {}): {}",
            self.lat, self.lon, self.prediction
        )
    }
}

/// What a click resulted in.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Selected {
        index: usize,
        prediction: PredictionResult,
    },
    NotReady,
    EmptyDataset,
}

/// The widgets a click updates. The text panel may be absent.
pub struct Surfaces<'a> {
    pub map: &'a mut dyn MapWidget,
    pub chart: &'a mut dyn ChartWidget,
    pub panel: Option<&'a mut dyn TextPanel>,
    pub notifier: &'a mut dyn Notifier,
}

// ---------------------------------------------------------------------------
// Click handling
// ---------------------------------------------------------------------------

/// Resolve the nearest sample to `point`, predict its bloom step and push
/// the result to every surface. Runs synchronously on the UI thread.
pub fn handle_click(
    point: GeoPoint,
    dataset: Result<&Dataset, NotReady>,
    surfaces: Surfaces<'_>,
) -> ClickOutcome {
    let dataset = match dataset {
        Ok(ds) => ds,
        Err(e) => {
            log::warn!("Click at {point} ignored: {e}");
            surfaces.notifier.warn(e.to_string());
            return ClickOutcome::NotReady;
        }
    };

    let index = match nearest::nearest_index(point, dataset) {
        Ok(i) => i,
        Err(e) => {
            log::warn!("Click at {point} ignored: {e}");
            surfaces.notifier.warn(e.to_string());
            return ClickOutcome::EmptyDataset;
        }
    };
    let record = &dataset.locations[index];
    log::info!("Click at: {point} → nearest location: {}", record.point());

    let prediction = bloom::predict(&record.ndvi_series);
    log::info!("Bloom result: {prediction}");

    present(point, index, record, prediction, surfaces);
    ClickOutcome::Selected { index, prediction }
}

fn present(
    click: GeoPoint,
    index: usize,
    record: &LocationRecord,
    prediction: PredictionResult,
    surfaces: Surfaces<'_>,
) {
    surfaces.map.show_popup(
        click,
        PopupContent {
            headline: prediction.to_string(),
            detail: format!("Lat: {}, Lon: {}", record.lat, record.lon),
        },
    );
    surfaces.map.highlight(index);

    if let Some(panel) = surfaces.panel {
        panel.set_text(PanelText {
            lat: record.lat,
            lon: record.lon,
            prediction,
        });
    }

    surfaces.chart.replace_series(&record.ndvi_series);
    surfaces.chart.redraw();
}
