use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::model::GeoPoint;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "bloomwatch.json";

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

/// Start-up settings. Every key is optional in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Path or URL of the NDVI dataset.
    pub dataset_source: String,
    pub map_center: [f64; 2],
    pub map_zoom: u8,
    /// Slippy-map URL template with `{z}`, `{x}`, `{y}` (and optional `{s}`).
    pub tile_url: String,
    pub tile_attribution: String,
    /// Concurrent tile downloads.
    pub tile_workers: usize,
    /// Decoded tiles kept as textures.
    pub tile_cache_size: usize,
    pub window_size: [f32; 2],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            dataset_source: "ndvi_data.json".into(),
            map_center: [20.5937, 78.9629],
            map_zoom: 4,
            tile_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            tile_attribution: "© OpenStreetMap contributors".into(),
            tile_workers: 4,
            tile_cache_size: 256,
            window_size: [1200.0, 900.0],
        }
    }
}

impl ViewerConfig {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.map_center[0], self.map_center[1])
    }

    /// Read a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Read `path` when it exists; fall back to defaults otherwise, or when
    /// the file is malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Using configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("Ignoring config file: {e:#}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ViewerConfig::load_or_default(&dir.path().join(CONFIG_FILE));
        assert_eq!(cfg, ViewerConfig::default());
        assert_eq!(cfg.center(), GeoPoint::new(20.5937, 78.9629));
        assert_eq!(cfg.map_zoom, 4);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(br#"{ "dataset_source": "https://example.org/ndvi.json", "map_zoom": 6 }"#)
            .unwrap();
        let cfg = ViewerConfig::load(temp.path()).unwrap();
        assert_eq!(cfg.dataset_source, "https://example.org/ndvi.json");
        assert_eq!(cfg.map_zoom, 6);
        assert_eq!(cfg.tile_url, ViewerConfig::default().tile_url);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"map_zoom = 3").unwrap();
        assert!(ViewerConfig::load(temp.path()).is_err());
        assert_eq!(ViewerConfig::load_or_default(temp.path()), ViewerConfig::default());
    }
}
