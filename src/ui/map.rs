use std::collections::HashSet;

use eframe::egui::{
    self, Align2, Color32, CornerRadius, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2, pos2, vec2,
};

use super::mercator::{TILE_SIZE, TileId, Viewport};
use super::tiles::TileLayer;
use crate::color::ndvi_color;
use crate::config::ViewerConfig;
use crate::data::model::{Dataset, GeoPoint};
use crate::presenter::{MapWidget, PopupContent};

const MAP_HEIGHT: f32 = 480.0;
const MARKER_RADIUS: f32 = 5.0;
const PLACEHOLDER: Color32 = Color32::from_rgb(0xdd, 0xe3, 0xe8);

// ---------------------------------------------------------------------------
// Slippy map widget
// ---------------------------------------------------------------------------

/// Interactive tile map with dataset markers and a single popup.
pub struct SlippyMap {
    viewport: Viewport,
    tiles: TileLayer,
    popup: Option<(GeoPoint, PopupContent)>,
    highlighted: Option<usize>,
}

impl SlippyMap {
    pub fn new(config: &ViewerConfig, ctx: &egui::Context) -> Self {
        Self {
            viewport: Viewport::new(config.center(), config.map_zoom),
            tiles: TileLayer::new(
                &config.tile_url,
                &config.tile_attribution,
                config.tile_workers,
                config.tile_cache_size,
                ctx,
            ),
            popup: None,
            highlighted: None,
        }
    }

    /// Draw the map and handle pan/zoom. Returns the clicked point, if any.
    pub fn show(&mut self, ui: &mut Ui, dataset: Option<&Dataset>) -> Option<GeoPoint> {
        self.tiles.pump(ui.ctx());

        let size = vec2(ui.available_width(), MAP_HEIGHT);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
        self.viewport.size = [f64::from(rect.width()), f64::from(rect.height())];

        if response.dragged() {
            let d = response.drag_delta();
            self.viewport.pan([f64::from(d.x), f64::from(d.y)]);
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let anchor = response
                    .hover_pos()
                    .map(|p| p - rect.min)
                    .unwrap_or(rect.size() / 2.0);
                let zoom = if scroll > 0.0 {
                    self.viewport.zoom.saturating_add(1)
                } else {
                    self.viewport.zoom.saturating_sub(1)
                };
                self.viewport
                    .zoom_around([f64::from(anchor.x), f64::from(anchor.y)], zoom);
            }
        }

        let clicked = if response.clicked() {
            response.interact_pointer_pos().map(|pos| {
                let local = pos - rect.min;
                self.viewport.to_geo([f64::from(local.x), f64::from(local.y)])
            })
        } else {
            None
        };

        let painter = ui.painter_at(rect);
        self.paint_tiles(&painter, rect);
        if let Some(ds) = dataset {
            self.paint_markers(&painter, rect, ds);
        }
        self.paint_popup(&painter, rect, ui);
        self.paint_attribution(&painter, rect);
        self.zoom_buttons(ui, rect);

        clicked
    }

    fn screen(&self, rect: Rect, point: GeoPoint) -> Pos2 {
        let [x, y] = self.viewport.to_screen(point);
        rect.min + vec2(x as f32, y as f32)
    }

    fn paint_tiles(&mut self, painter: &egui::Painter, rect: Rect) {
        let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
        let side = TILE_SIZE as f32;
        let placed_tiles = self.viewport.visible_tiles();
        let visible: HashSet<TileId> = placed_tiles.iter().map(|p| p.id).collect();
        self.tiles.retain_visible(&visible);
        for placed in placed_tiles {
            let min = rect.min + vec2(placed.offset[0] as f32, placed.offset[1] as f32);
            let tile_rect = Rect::from_min_size(min, Vec2::splat(side));
            match self.tiles.get(placed.id) {
                Some(texture) => painter.image(texture.id(), tile_rect, uv, Color32::WHITE),
                None => painter.rect_filled(tile_rect, 0.0, PLACEHOLDER),
            };
        }
    }

    fn paint_markers(&self, painter: &egui::Painter, rect: Rect, dataset: &Dataset) {
        let outline = Stroke::new(1.0, Color32::from_black_alpha(160));
        for (i, loc) in dataset.locations.iter().enumerate() {
            let pos = self.screen(rect, loc.point());
            if !rect.expand(MARKER_RADIUS).contains(pos) {
                continue;
            }
            let fill = ndvi_color(loc.peak_ndvi().unwrap_or(0.0));
            painter.circle(pos, MARKER_RADIUS, fill, outline);
            if self.highlighted == Some(i) {
                painter.circle_stroke(pos, MARKER_RADIUS + 3.0, Stroke::new(2.0, Color32::WHITE));
            }
        }
    }

    fn paint_popup(&self, painter: &egui::Painter, rect: Rect, ui: &Ui) {
        let Some((at, content)) = &self.popup else {
            return;
        };
        let anchor = self.screen(rect, *at);
        if !rect.contains(anchor) {
            return;
        }

        let visuals = ui.visuals();
        let headline = painter.layout_no_wrap(
            content.headline.clone(),
            FontId::proportional(15.0),
            visuals.strong_text_color(),
        );
        let detail = painter.layout_no_wrap(
            content.detail.clone(),
            FontId::proportional(12.0),
            visuals.text_color(),
        );

        let pad = 8.0;
        let width = headline.size().x.max(detail.size().x) + 2.0 * pad;
        let height = headline.size().y + detail.size().y + 2.0 * pad + 2.0;
        let bubble = Rect::from_center_size(
            anchor - vec2(0.0, height / 2.0 + 10.0),
            vec2(width, height),
        );

        painter.rect_filled(bubble, CornerRadius::same(6), visuals.window_fill);
        painter.rect_stroke(
            bubble,
            CornerRadius::same(6),
            visuals.window_stroke,
            egui::StrokeKind::Outside,
        );
        painter.line_segment(
            [pos2(anchor.x, bubble.bottom()), anchor],
            visuals.window_stroke,
        );

        let text_pos = bubble.min + vec2(pad, pad);
        let detail_pos = text_pos + vec2(0.0, headline.size().y + 2.0);
        painter.galley(text_pos, headline, visuals.strong_text_color());
        painter.galley(detail_pos, detail, visuals.text_color());
    }

    fn paint_attribution(&self, painter: &egui::Painter, rect: Rect) {
        let galley = painter.layout_no_wrap(
            self.tiles.attribution().to_string(),
            FontId::proportional(11.0),
            Color32::from_gray(40),
        );
        let bg = Rect::from_min_size(
            rect.right_bottom() - galley.size() - vec2(8.0, 4.0),
            galley.size() + vec2(8.0, 4.0),
        );
        painter.rect_filled(bg, 0.0, Color32::from_white_alpha(190));
        painter.galley(bg.min + vec2(4.0, 2.0), galley, Color32::from_gray(40));
    }

    fn zoom_buttons(&mut self, ui: &mut Ui, rect: Rect) {
        let center = [f64::from(rect.width()) / 2.0, f64::from(rect.height()) / 2.0];
        let button = |ui: &mut Ui, offset: f32, label: &str| {
            let r = Rect::from_min_size(rect.min + vec2(10.0, 10.0 + offset), vec2(28.0, 28.0));
            ui.put(r, egui::Button::new(label)).clicked()
        };
        if button(ui, 0.0, "+") {
            let zoom = self.viewport.zoom.saturating_add(1);
            self.viewport.zoom_around(center, zoom);
        }
        if button(ui, 32.0, "−") {
            let zoom = self.viewport.zoom.saturating_sub(1);
            self.viewport.zoom_around(center, zoom);
        }
        ui.painter_at(rect).text(
            rect.min + vec2(46.0, 24.0),
            Align2::LEFT_CENTER,
            format!("z{}", self.viewport.zoom),
            FontId::monospace(11.0),
            Color32::from_gray(60),
        );
    }
}

impl MapWidget for SlippyMap {
    fn show_popup(&mut self, at: GeoPoint, content: PopupContent) {
        self.popup = Some((at, content));
    }

    fn highlight(&mut self, index: usize) {
        self.highlighted = Some(index);
    }
}
