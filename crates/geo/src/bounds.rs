use serde::{Deserialize, Serialize};

use crate::latlng::LatLng;

/// Rectangular geographic extent (degrees).
///
/// `west > east` means the box crosses the antimeridian; containment
/// handles that wrap explicitly.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    pub fn contains(&self, p: LatLng) -> bool {
        if p.lat < self.south || p.lat > self.north {
            return false;
        }
        if self.west <= self.east {
            p.lng >= self.west && p.lng <= self.east
        } else {
            p.lng >= self.west || p.lng <= self.east
        }
    }

    /// Grows the box by `pad_deg` on every side, clamped to valid ranges.
    pub fn padded(&self, pad_deg: f64) -> Self {
        Self {
            north: (self.north + pad_deg).min(90.0),
            south: (self.south - pad_deg).max(-90.0),
            east: (self.east + pad_deg).min(180.0),
            west: (self.west - pad_deg).max(-180.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;
    use crate::latlng::LatLng;

    #[test]
    fn contains_inside_and_excludes_outside() {
        let b = GeoBounds::new(46.0, 45.0, -122.0, -123.0);
        assert!(b.contains(LatLng::new(45.5, -122.5)));
        assert!(!b.contains(LatLng::new(44.9, -122.5)));
        assert!(!b.contains(LatLng::new(45.5, -121.9)));
    }

    #[test]
    fn edges_are_inclusive() {
        let b = GeoBounds::new(46.0, 45.0, -122.0, -123.0);
        assert!(b.contains(LatLng::new(46.0, -123.0)));
        assert!(b.contains(LatLng::new(45.0, -122.0)));
    }

    #[test]
    fn antimeridian_wrap() {
        let b = GeoBounds::new(10.0, -10.0, -170.0, 170.0);
        assert!(b.contains(LatLng::new(0.0, 175.0)));
        assert!(b.contains(LatLng::new(0.0, -175.0)));
        assert!(!b.contains(LatLng::new(0.0, 0.1)));
    }
}
