use serde::{Deserialize, Serialize};

/// Geographic position in degrees (WGS84).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    NonFinite,
    LatOutOfRange,
    LngOutOfRange,
    /// Exactly (0,0) — the degenerate point bad geocoders emit for
    /// missing data.
    NullIsland,
}

impl std::fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateError::NonFinite => write!(f, "coordinate is not finite"),
            CoordinateError::LatOutOfRange => write!(f, "latitude outside [-90, 90]"),
            CoordinateError::LngOutOfRange => write!(f, "longitude outside [-180, 180]"),
            CoordinateError::NullIsland => write!(f, "degenerate (0, 0) coordinate"),
        }
    }
}

impl std::error::Error for CoordinateError {}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Checks the valid-range and non-(0,0) invariants.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if self.lat < -90.0 || self.lat > 90.0 {
            return Err(CoordinateError::LatOutOfRange);
        }
        if self.lng < -180.0 || self.lng > 180.0 {
            return Err(CoordinateError::LngOutOfRange);
        }
        if self.lat == 0.0 && self.lng == 0.0 {
            return Err(CoordinateError::NullIsland);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinateError, LatLng};

    #[test]
    fn in_range_coordinates_validate() {
        assert!(LatLng::new(45.52, -122.68).is_valid());
        assert!(LatLng::new(-90.0, 180.0).is_valid());
    }

    #[test]
    fn rejects_out_of_range_and_non_finite() {
        assert_eq!(
            LatLng::new(91.0, 0.0).validate(),
            Err(CoordinateError::LatOutOfRange)
        );
        assert_eq!(
            LatLng::new(0.0, -181.0).validate(),
            Err(CoordinateError::LngOutOfRange)
        );
        assert_eq!(
            LatLng::new(f64::NAN, 0.0).validate(),
            Err(CoordinateError::NonFinite)
        );
    }

    #[test]
    fn rejects_null_island() {
        assert_eq!(
            LatLng::new(0.0, 0.0).validate(),
            Err(CoordinateError::NullIsland)
        );
        // A zero latitude alone is fine.
        assert!(LatLng::new(0.0, 6.73).is_valid());
    }
}
