use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// NDVI colour ramp
// ---------------------------------------------------------------------------

/// Hue for bare soil (NDVI 0).
const SOIL_HUE: f32 = 30.0;
/// Hue for dense vegetation (NDVI 1).
const CANOPY_HUE: f32 = 125.0;

/// Chart line colour (#2e8b57).
pub const TREND_LINE: Color32 = Color32::from_rgb(0x2e, 0x8b, 0x57);
/// Dashed bloom-threshold guide on the chart.
pub const THRESHOLD_LINE: Color32 = Color32::from_rgb(0xd9, 0x6c, 0x8c);

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Map an NDVI value to a brown → green colour. Out-of-range input is clamped.
pub fn ndvi_color(ndvi: f64) -> Color32 {
    let t = if ndvi.is_finite() { ndvi.clamp(0.0, 1.0) as f32 } else { 0.0 };
    let hue = SOIL_HUE + (CANOPY_HUE - SOIL_HUE) * t;
    let lightness = 0.55 - 0.2 * t;
    hsl_to_color32(Hsl::new(hue, 0.75, lightness))
}

/// Legend entries sampled evenly over [0, 1].
pub fn legend_entries(n: usize) -> Vec<(String, Color32)> {
    if n < 2 {
        return vec![(format!("{:.2}", 0.0), ndvi_color(0.0))];
    }
    (0..n)
        .map(|i| {
            let v = i as f64 / (n - 1) as f64;
            (format!("{v:.2}"), ndvi_color(v))
        })
        .collect()
}
