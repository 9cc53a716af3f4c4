use eframe::egui::{Context, Ui};
use egui_plot::{HLine, Legend, Line, Plot, PlotPoints};

use crate::analysis::bloom::BLOOM_THRESHOLD;
use crate::color::{THRESHOLD_LINE, TREND_LINE};
use crate::presenter::ChartWidget;

/// Number of time steps the axis shows before any data arrives.
pub const DEFAULT_STEPS: usize = 8;

// ---------------------------------------------------------------------------
// NDVI trend chart
// ---------------------------------------------------------------------------

/// Line chart of the selected location's NDVI series.
pub struct NdviChart {
    series: Vec<f64>,
    ctx: Option<Context>,
}

impl NdviChart {
    /// Eight zero-valued steps. `ctx` is used to request repaints.
    pub fn new(ctx: Option<Context>) -> Self {
        Self {
            series: vec![0.0; DEFAULT_STEPS],
            ctx,
        }
    }

    #[cfg(test)]
    pub fn series(&self) -> &[f64] {
        &self.series
    }

    /// Axis labels: "Step 1" … "Step n", at least [`DEFAULT_STEPS`] of them.
    pub fn labels(&self) -> Vec<String> {
        (1..=self.series.len().max(DEFAULT_STEPS))
            .map(|i| format!("Step {i}"))
            .collect()
    }

    pub fn show(&self, ui: &mut Ui) {
        let labels = self.labels();
        let steps = labels.len();
        let points: PlotPoints = self
            .series
            .iter()
            .enumerate()
            .map(|(i, &v)| [(i + 1) as f64, v])
            .collect();

        Plot::new("ndvi_trend")
            .legend(Legend::default())
            .height(260.0)
            .x_axis_label("Time step")
            .y_axis_label("NDVI")
            .include_x(1.0)
            .include_x(steps as f64)
            .include_y(0.0)
            .include_y(1.0)
            .x_axis_formatter(move |mark, _range| {
                let step = mark.value;
                if step >= 1.0 && step.fract() == 0.0 {
                    labels.get(step as usize - 1).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .allow_drag(false)
            .allow_scroll(false)
            .allow_zoom(false)
            .allow_boxed_zoom(false)
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(points)
                        .name("NDVI Trend")
                        .color(TREND_LINE)
                        .fill(0.0)
                        .width(2.0),
                );
                plot_ui.hline(
                    HLine::new(BLOOM_THRESHOLD)
                        .name("Bloom threshold")
                        .color(THRESHOLD_LINE)
                        .style(egui_plot::LineStyle::dashed_loose()),
                );
            });
    }
}

impl ChartWidget for NdviChart {
    fn replace_series(&mut self, series: &[f64]) {
        self.series = series.to_vec();
    }

    fn redraw(&mut self) {
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }
}
