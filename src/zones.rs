//! Protected-area zone table and point lookup.
//!
//! Zones are rectangular lon/lat boxes. Settlement outside every tracked
//! zone is reported as `OUTSIDE`; particles that never settle are reported
//! as `UNSETTLED`. The connectivity layer keys its matrices on these names.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub const DEST_OUTSIDE: &str = "OUTSIDE";
pub const DEST_UNSETTLED: &str = "UNSETTLED";

/// A named rectangular protected-area zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Zone {
    pub fn new(name: &str, lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Zone {
        Zone {
            name: name.to_string(),
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        }
    }

    /// Whether a lon/lat point falls inside this zone (bounds inclusive).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }
}

/// The marine protected areas tracked in the Bohai Sea study region.
pub static DEFAULT_ZONES: Lazy<Vec<Zone>> = Lazy::new(|| {
    vec![
        Zone::new("MNR-7", 118.0, 118.3, 38.8, 39.1),
        Zone::new("MNR-8-N", 119.0, 119.3, 39.2, 39.5),
        Zone::new("MNR-8-S", 119.0, 119.3, 38.9, 39.2),
        Zone::new("SMPA-2", 120.0, 120.3, 38.5, 38.8),
        Zone::new("SMPA-4", 120.5, 120.8, 38.2, 38.5),
    ]
});

/// Find the first zone containing a point, if any.
///
/// Zone boxes in the default table are disjoint; for overlapping custom
/// tables the earliest entry wins.
pub fn zone_for(zones: &[Zone], lon: f64, lat: f64) -> Option<&str> {
    zones
        .iter()
        .find(|zone| zone.contains(lon, lat))
        .map(|zone| zone.name.as_str())
}

/// Zone name for a settlement point: the containing zone or `OUTSIDE`.
pub fn settlement_zone(zones: &[Zone], lon: f64, lat: f64) -> String {
    zone_for(zones, lon, lat)
        .unwrap_or(DEST_OUTSIDE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_has_five_zones() {
        assert_eq!(DEFAULT_ZONES.len(), 5);
        let names: Vec<&str> = DEFAULT_ZONES.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, ["MNR-7", "MNR-8-N", "MNR-8-S", "SMPA-2", "SMPA-4"]);
    }

    #[test]
    fn test_point_lookup() {
        assert_eq!(zone_for(&DEFAULT_ZONES, 118.15, 38.95), Some("MNR-7"));
        assert_eq!(zone_for(&DEFAULT_ZONES, 119.15, 39.35), Some("MNR-8-N"));
        assert_eq!(zone_for(&DEFAULT_ZONES, 119.15, 39.05), Some("MNR-8-S"));
        // Open water between the zones
        assert_eq!(zone_for(&DEFAULT_ZONES, 119.7, 38.6), None);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert_eq!(zone_for(&DEFAULT_ZONES, 118.0, 38.8), Some("MNR-7"));
        assert_eq!(zone_for(&DEFAULT_ZONES, 118.3, 39.1), Some("MNR-7"));
    }

    #[test]
    fn test_settlement_zone_falls_back_to_outside() {
        assert_eq!(settlement_zone(&DEFAULT_ZONES, 121.5, 37.9), DEST_OUTSIDE);
        assert_eq!(settlement_zone(&DEFAULT_ZONES, 120.6, 38.3), "SMPA-4");
    }
}
