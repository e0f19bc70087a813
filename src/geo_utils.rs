//! Utilities for great-circle geometry on the spherical Earth
//! used by event recording and dispersal-distance analysis.

use crate::constants::{EARTH_RADIUS_KM, HOURS_PER_DAY};

/// Computes the great-circle distance between two lon/lat points in km
/// using the haversine formula on a sphere of radius 6371 km.
///
/// # Arguments
/// - `lon1`, `lat1`: First point in decimal degrees
/// - `lon2`, `lat2`: Second point in decimal degrees
///
/// # Returns
/// Distance along the sphere surface in km
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let lon1r = lon1.to_radians();
    let lat1r = lat1.to_radians();
    let lon2r = lon2.to_radians();
    let lat2r = lat2.to_radians();

    let dlon = lon2r - lon1r;
    let dlat = lat2r - lat1r;

    let a = (dlat / 2.0).sin().powi(2) + lat1r.cos() * lat2r.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Hour-of-day in [0, 24) for a clock that started at `start_hour_of_day`
/// and has run for `hours_since_start` hours.
pub fn hour_of_day(start_hour_of_day: f64, hours_since_start: f64) -> f64 {
    (start_hour_of_day + hours_since_start).rem_euclid(HOURS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_haversine_zero_for_coincident_points() {
        assert_abs_diff_eq!(haversine_km(119.0, 39.0, 119.0, 39.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_haversine_symmetric() {
        let d_ab = haversine_km(118.0, 38.8, 120.5, 38.2);
        let d_ba = haversine_km(120.5, 38.2, 118.0, 38.8);
        assert_abs_diff_eq!(d_ab, d_ba, epsilon = 1e-9);
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude along a meridian ≈ 111.19 km on this sphere
        let d = haversine_km(119.0, 38.0, 119.0, 39.0);
        assert_abs_diff_eq!(d, EARTH_RADIUS_KM * 1.0_f64.to_radians(), epsilon = 0.01);
        assert_abs_diff_eq!(d, 111.19, epsilon = 0.05);
    }

    #[test]
    fn test_haversine_triangle_inequality() {
        let points = [
            (118.0, 38.8),
            (119.15, 39.35),
            (120.15, 38.65),
            (120.65, 38.35),
        ];

        for &(lon_a, lat_a) in &points {
            for &(lon_b, lat_b) in &points {
                for &(lon_c, lat_c) in &points {
                    let d_ab = haversine_km(lon_a, lat_a, lon_b, lat_b);
                    let d_bc = haversine_km(lon_b, lat_b, lon_c, lat_c);
                    let d_ac = haversine_km(lon_a, lat_a, lon_c, lat_c);
                    assert!(d_ac <= d_ab + d_bc + 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_hour_of_day_wraps() {
        assert_abs_diff_eq!(hour_of_day(0.0, 6.0), 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hour_of_day(6.0, 20.0), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hour_of_day(0.0, 48.5), 0.5, epsilon = 1e-12);
    }
}
