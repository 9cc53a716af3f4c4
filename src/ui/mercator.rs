//! Web Mercator maths for the slippy map: world pixels, tile addressing and
//! the visible viewport.

use std::f64::consts::PI;

use crate::data::model::GeoPoint;

/// Edge length of a map tile in pixels.
pub const TILE_SIZE: f64 = 256.0;
/// Latitude limit of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 18;

fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * f64::from(1u32 << zoom)
}

/// Wrap a longitude into [-180, 180).
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Geographic point → world pixel coordinates at `zoom`.
pub fn project(point: GeoPoint, zoom: u8) -> [f64; 2] {
    let size = world_size(zoom);
    let lat_rad = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (point.lon + 180.0) / 360.0 * size;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * size;
    [x, y]
}

/// World pixel coordinates at `zoom` → geographic point.
pub fn unproject(px: [f64; 2], zoom: u8) -> GeoPoint {
    let size = world_size(zoom);
    let lon = px[0] / size * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * px[1] / size);
    let lat = n.sinh().atan().to_degrees();
    GeoPoint::new(lat, lon)
}

// ---------------------------------------------------------------------------
// Tile addressing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// Fill a `{z}/{x}/{y}` URL template. `{s}` rotates over `a`, `b`, `c`.
    pub fn url(&self, template: &str) -> String {
        let subdomain = ["a", "b", "c"][((self.x + self.y) % 3) as usize];
        template
            .replace("{s}", subdomain)
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// A tile to draw and the offset of its top-left corner from the viewport's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub id: TileId,
    pub offset: [f64; 2],
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Map centre and zoom plus the on-screen size in points. Screen
/// coordinates are relative to the top-left corner of the map area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: GeoPoint,
    pub zoom: u8,
    pub size: [f64; 2],
}

impl Viewport {
    pub fn new(center: GeoPoint, zoom: u8) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            size: [0.0, 0.0],
        }
    }

    fn top_left(&self) -> [f64; 2] {
        let c = project(self.center, self.zoom);
        [c[0] - self.size[0] / 2.0, c[1] - self.size[1] / 2.0]
    }

    /// Geographic point → screen position, using the copy of the world
    /// closest to the viewport centre.
    pub fn to_screen(&self, point: GeoPoint) -> [f64; 2] {
        let size = world_size(self.zoom);
        let p = project(point, self.zoom);
        let c = project(self.center, self.zoom);
        let dx = p[0] - c[0];
        let dx = dx - size * (dx / size).round();
        [self.size[0] / 2.0 + dx, p[1] - c[1] + self.size[1] / 2.0]
    }

    /// Screen position → geographic point, longitude wrapped into [-180, 180).
    pub fn to_geo(&self, screen: [f64; 2]) -> GeoPoint {
        let tl = self.top_left();
        let p = unproject([tl[0] + screen[0], tl[1] + screen[1]], self.zoom);
        GeoPoint::new(p.lat, wrap_lon(p.lon))
    }

    /// Shift the map by a screen-space drag.
    pub fn pan(&mut self, delta: [f64; 2]) {
        let c = project(self.center, self.zoom);
        let moved = unproject([c[0] - delta[0], c[1] - delta[1]], self.zoom);
        self.center = GeoPoint::new(
            moved.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            wrap_lon(moved.lon),
        );
    }

    /// Change zoom keeping the point under `anchor` (screen) fixed.
    pub fn zoom_around(&mut self, anchor: [f64; 2], zoom: u8) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if zoom == self.zoom {
            return;
        }
        let fixed = self.to_geo(anchor);
        self.zoom = zoom;
        let now = self.to_screen(fixed);
        self.pan([anchor[0] - now[0], anchor[1] - now[1]]);
    }

    /// Tiles covering the viewport. X wraps around the antimeridian; rows
    /// outside the world are skipped.
    pub fn visible_tiles(&self) -> Vec<PlacedTile> {
        let tl = self.top_left();
        let n = 1i64 << self.zoom;
        let first_x = (tl[0] / TILE_SIZE).floor() as i64;
        let last_x = ((tl[0] + self.size[0]) / TILE_SIZE).floor() as i64;
        let first_y = ((tl[1] / TILE_SIZE).floor() as i64).max(0);
        let last_y = (((tl[1] + self.size[1]) / TILE_SIZE).floor() as i64).min(n - 1);

        let mut tiles = Vec::new();
        for ty in first_y..=last_y {
            for tx in first_x..=last_x {
                tiles.push(PlacedTile {
                    id: TileId {
                        z: self.zoom,
                        x: tx.rem_euclid(n) as u32,
                        y: ty as u32,
                    },
                    offset: [
                        tx as f64 * TILE_SIZE - tl[0],
                        ty as f64 * TILE_SIZE - tl[1],
                    ],
                });
            }
        }
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn origin_projects_to_world_center() {
        let p = project(GeoPoint::new(0.0, 0.0), 2);
        assert!(close(p[0], 512.0) && close(p[1], 512.0));
    }

    #[test]
    fn unproject_inverts_project() {
        for &(lat, lon) in &[(20.5937, 78.9629), (-33.9, 18.4), (64.1, -21.9), (0.0, 179.9)] {
            for zoom in [1, 4, 12] {
                let back = unproject(project(GeoPoint::new(lat, lon), zoom), zoom);
                assert!(close(back.lat, lat), "lat {lat} at z{zoom}: {}", back.lat);
                assert!(close(back.lon, lon), "lon {lon} at z{zoom}: {}", back.lon);
            }
        }
    }

    #[test]
    fn tile_url_fills_template() {
        let id = TileId { z: 4, x: 11, y: 7 };
        assert_eq!(
            id.url("https://tile.openstreetmap.org/{z}/{x}/{y}.png"),
            "https://tile.openstreetmap.org/4/11/7.png"
        );
        assert_eq!(
            id.url("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png"),
            "https://a.tile.openstreetmap.org/4/11/7.png"
        );
        let id = TileId { z: 4, x: 11, y: 6 };
        assert_eq!(
            id.url("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png"),
            "https://c.tile.openstreetmap.org/4/11/6.png"
        );
    }

    #[test]
    fn points_across_the_antimeridian_land_on_screen() {
        let mut vp = Viewport::new(GeoPoint::new(0.0, 179.0), 2);
        vp.size = [800.0, 600.0];

        // Two degrees east of the centre, past the antimeridian.
        let east = vp.to_screen(GeoPoint::new(0.0, -179.0));
        assert!((east[0] - (400.0 + 2.0 / 360.0 * 1024.0)).abs() < 1e-6);
        assert!(close(east[1], 300.0));

        let west = vp.to_screen(GeoPoint::new(0.0, 177.0));
        assert!((west[0] - (400.0 - 2.0 / 360.0 * 1024.0)).abs() < 1e-6);

        let clicked = vp.to_geo([700.0, 300.0]);
        assert!(clicked.lon < 0.0);
        let back = vp.to_screen(clicked);
        assert!((back[0] - 700.0).abs() < 1e-6);
    }

    #[test]
    fn screen_and_geo_round_trip_through_viewport() {
        let mut vp = Viewport::new(GeoPoint::new(20.5937, 78.9629), 4);
        vp.size = [800.0, 480.0];
        let center = vp.to_screen(vp.center);
        assert!(close(center[0], 400.0) && close(center[1], 240.0));

        let geo = vp.to_geo([123.0, 45.0]);
        let screen = vp.to_screen(geo);
        assert!((screen[0] - 123.0).abs() < 1e-6 && (screen[1] - 45.0).abs() < 1e-6);
    }

    #[test]
    fn visible_tiles_wrap_in_x_and_clip_in_y() {
        let mut vp = Viewport::new(GeoPoint::new(0.0, 179.0), 1);
        vp.size = [600.0, 600.0];
        let tiles = vp.visible_tiles();
        assert!(tiles.iter().all(|t| t.id.x < 2 && t.id.y < 2));
        assert!(tiles.iter().any(|t| t.id.x == 0 && t.offset[0] > 0.0));
    }

    #[test]
    fn zoom_keeps_anchor_point_fixed() {
        let mut vp = Viewport::new(GeoPoint::new(20.0, 78.0), 4);
        vp.size = [800.0, 600.0];
        let anchor = [200.0, 150.0];
        let before = vp.to_geo(anchor);
        vp.zoom_around(anchor, 6);
        let after = vp.to_geo(anchor);
        assert_eq!(vp.zoom, 6);
        assert!((before.lat - after.lat).abs() < 1e-6);
        assert!((before.lon - after.lon).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::new(GeoPoint::new(0.0, 0.0), 40);
        assert_eq!(vp.zoom, MAX_ZOOM);
        vp.zoom_around([0.0, 0.0], 0);
        assert_eq!(vp.zoom, MIN_ZOOM);
    }

    #[test]
    fn longitudes_wrap() {
        assert!(close(wrap_lon(190.0), -170.0));
        assert!(close(wrap_lon(-181.0), 179.0));
        assert!(close(wrap_lon(45.0), 45.0));
    }
}
