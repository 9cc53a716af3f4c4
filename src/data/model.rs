use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GeoPoint – a (lat, lon) pair in degrees
// ---------------------------------------------------------------------------

/// A geographic point in raw degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Euclidean distance in degree space (no geodesic correction).
    pub fn planar_distance(&self, other: &GeoPoint) -> f64 {
        (self.lat - other.lat).hypot(self.lon - other.lon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

// ---------------------------------------------------------------------------
// LocationRecord – one sample point with its NDVI time series
// ---------------------------------------------------------------------------

/// A simulated sample location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub lat: f64,
    pub lon: f64,
    /// NDVI per time step, oldest first. Values are expected in [0, 1].
    pub ndvi_series: Vec<f64>,
}

impl LocationRecord {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Highest NDVI value in the series, `None` for an empty series.
    pub fn peak_ndvi(&self) -> Option<f64> {
        self.ndvi_series.iter().copied().reduce(f64::max)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded collection
// ---------------------------------------------------------------------------

/// The full parsed dataset. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub locations: Vec<LocationRecord>,
}

impl Dataset {
    pub fn new(locations: Vec<LocationRecord>) -> Self {
        Self { locations }
    }

    /// Number of locations.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Length of the longest NDVI series (0 for an empty dataset).
    pub fn max_series_len(&self) -> usize {
        self.locations
            .iter()
            .map(|loc| loc.ndvi_series.len())
            .max()
            .unwrap_or(0)
    }
}
