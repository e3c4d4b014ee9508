use geo::{CoordinateError, LatLng};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque listing identity assigned by the data service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListingId(pub u64);

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A producer storefront record as served by the data service.
///
/// Read-only to the engine. The one normalization applied locally is that
/// `lat`/`lng` may arrive as JSON strings (legacy rows) and are parsed to
/// numbers on deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(deserialize_with = "coord_from_string_or_number")]
    pub lat: f64,
    #[serde(deserialize_with = "coord_from_string_or_number")]
    pub lng: f64,
}

fn default_available() -> bool {
    true
}

impl Listing {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Valid-range and non-(0,0) check on the geographic position.
    pub fn validate_position(&self) -> Result<(), CoordinateError> {
        self.position().validate()
    }
}

/// Accepts `12.5` or `"12.5"`; anything unparsable becomes NaN so the
/// record survives deserialization and is dropped by position validation
/// instead of aborting the whole page.
fn coord_from_string_or_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n,
        Raw::Text(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
    })
}

#[cfg(test)]
mod tests {
    use super::{Listing, ListingId};
    use geo::CoordinateError;

    #[test]
    fn deserializes_numeric_coordinates() {
        let l: Listing = serde_json::from_str(
            r#"{"id": 7, "name": "Hazel Hill Farm", "lat": 45.1, "lng": -122.9}"#,
        )
        .unwrap();
        assert_eq!(l.id, ListingId(7));
        assert_eq!(l.lat, 45.1);
        assert!(l.available);
        assert!(l.tags.is_empty());
    }

    #[test]
    fn normalizes_string_coordinates() {
        let l: Listing = serde_json::from_str(
            r#"{"id": 8, "name": "Creekside Dairy", "lat": " 45.2 ", "lng": "-123.0"}"#,
        )
        .unwrap();
        assert_eq!(l.lat, 45.2);
        assert_eq!(l.lng, -123.0);
        assert!(l.validate_position().is_ok());
    }

    #[test]
    fn unparsable_coordinate_fails_validation_not_deserialization() {
        let l: Listing = serde_json::from_str(
            r#"{"id": 9, "name": "Bad Row", "lat": "n/a", "lng": "-123.0"}"#,
        )
        .unwrap();
        assert_eq!(
            l.validate_position(),
            Err(CoordinateError::NonFinite)
        );
    }
}
