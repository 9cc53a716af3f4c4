use crate::data::model::{Dataset, GeoPoint, LocationRecord};
use crate::error::EmptyDatasetError;

// ---------------------------------------------------------------------------
// Nearest-location lookup
// ---------------------------------------------------------------------------

/// Index of the record closest to `point` in planar degree space.
///
/// Distance is `hypot(Δlat, Δlon)` on raw degrees, not geodesic. On exact
/// ties the earliest record wins.
pub fn nearest_index(point: GeoPoint, dataset: &Dataset) -> Result<usize, EmptyDatasetError> {
    let mut locations = dataset.locations.iter().enumerate();
    let (mut best, first) = locations.next().ok_or(EmptyDatasetError)?;
    let mut best_dist = point.planar_distance(&first.point());

    for (i, loc) in locations {
        let dist = point.planar_distance(&loc.point());
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    Ok(best)
}

/// The record closest to `point`. See [`nearest_index`].
pub fn nearest(point: GeoPoint, dataset: &Dataset) -> Result<&LocationRecord, EmptyDatasetError> {
    nearest_index(point, dataset).map(|i| &dataset.locations[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lat: f64, lon: f64) -> LocationRecord {
        LocationRecord {
            lat,
            lon,
            ndvi_series: vec![lat / 100.0],
        }
    }

    fn grid() -> Dataset {
        Dataset::new(vec![
            record(20.0, 78.0),
            record(28.6, 77.2),
            record(13.0, 80.2),
            record(19.0, 72.8),
        ])
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let ds = Dataset::default();
        assert_eq!(nearest(GeoPoint::new(0.0, 0.0), &ds), Err(EmptyDatasetError));
    }

    #[test]
    fn single_record_is_always_nearest() {
        let ds = Dataset::new(vec![record(-40.0, 170.0)]);
        assert_eq!(nearest_index(GeoPoint::new(60.0, -120.0), &ds), Ok(0));
    }

    #[test]
    fn picks_minimum_planar_distance() {
        let ds = grid();
        assert_eq!(nearest_index(GeoPoint::new(28.0, 77.0), &ds), Ok(1));
        assert_eq!(nearest_index(GeoPoint::new(12.5, 80.0), &ds), Ok(2));
        assert_eq!(nearest_index(GeoPoint::new(18.0, 73.5), &ds), Ok(3));
    }

    #[test]
    fn matches_brute_force_minimum() {
        let ds = grid();
        for lat in (-10..40).map(|v| v as f64 * 0.9) {
            for lon in (60..95).map(|v| v as f64 * 1.1) {
                let p = GeoPoint::new(lat, lon);
                let found = nearest(p, &ds).unwrap();
                let min = ds
                    .locations
                    .iter()
                    .map(|r| p.planar_distance(&r.point()))
                    .fold(f64::INFINITY, f64::min);
                assert_eq!(p.planar_distance(&found.point()), min);
            }
        }
    }

    #[test]
    fn ties_resolve_to_first_record() {
        let ds = Dataset::new(vec![record(1.0, 0.0), record(-1.0, 0.0), record(0.0, 1.0)]);
        assert_eq!(nearest_index(GeoPoint::new(0.0, 0.0), &ds), Ok(0));

        let dup = Dataset::new(vec![record(5.0, 5.0), record(5.0, 5.0)]);
        assert_eq!(nearest_index(GeoPoint::new(5.0, 5.0), &dup), Ok(0));
    }

    #[test]
    fn uses_degree_space_not_geodesic_distance() {
        // Near the pole a degree of longitude is short on the ground, but the
        // lookup still compares raw degrees.
        let ds = Dataset::new(vec![record(80.0, 10.0), record(83.0, 0.0)]);
        assert_eq!(nearest_index(GeoPoint::new(80.0, 0.0), &ds), Ok(1));
    }

    #[test]
    fn lookup_is_idempotent() {
        let ds = grid();
        let p = GeoPoint::new(22.2, 75.5);
        let a = nearest(p, &ds).unwrap();
        let b = nearest(p, &ds).unwrap();
        assert!(std::ptr::eq(a, b));
    }
}
