use geo::LatLng;

use crate::filters::{FilterKey, FilterSet};

/// Viewport seed + filter selection as carried in URL query params.
///
/// `lat`, `lng`, `zoom` seed the viewport on mount; filter values
/// round-trip as comma-joined lists per key. Parsing is best-effort:
/// malformed or invalid values are ignored rather than erroring, since
/// query strings are user-editable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryState {
    pub center: Option<LatLng>,
    pub zoom: Option<f64>,
    pub filters: FilterSet,
}

pub fn parse_query_pairs<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> QueryState {
    let mut lat: Option<f64> = None;
    let mut lng: Option<f64> = None;
    let mut state = QueryState::default();

    for (key, value) in pairs {
        match key {
            "lat" => lat = value.trim().parse().ok(),
            "lng" => lng = value.trim().parse().ok(),
            "zoom" => {
                state.zoom = value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|z| z.is_finite());
            }
            _ => {
                if let Some(filter_key) = FilterKey::parse(key) {
                    state.filters.set_comma_joined(filter_key, value);
                }
            }
        }
    }

    if let (Some(lat), Some(lng)) = (lat, lng) {
        let center = LatLng::new(lat, lng);
        if center.is_valid() {
            state.center = Some(center);
        }
    }

    state
}

/// Serializes viewport + filters back to query pairs, in a stable order
/// (`lat`, `lng`, `zoom`, then filter keys).
pub fn to_query_pairs(
    center: Option<LatLng>,
    zoom: Option<f64>,
    filters: &FilterSet,
) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(c) = center {
        pairs.push(("lat".to_string(), format!("{:.5}", c.lat)));
        pairs.push(("lng".to_string(), format!("{:.5}", c.lng)));
    }
    if let Some(z) = zoom {
        pairs.push(("zoom".to_string(), format!("{z}")));
    }
    for key in FilterKey::ALL {
        if let Some(joined) = filters.comma_joined(key) {
            pairs.push((key.as_str().to_string(), joined));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::{parse_query_pairs, to_query_pairs};
    use crate::filters::FilterKey;
    use geo::LatLng;

    #[test]
    fn parses_viewport_seed_and_filters() {
        let state = parse_query_pairs([
            ("lat", "45.52"),
            ("lng", "-122.68"),
            ("zoom", "13"),
            ("products", "eggs,dairy"),
            ("utm_source", "newsletter"),
        ]);
        assert_eq!(state.center, Some(LatLng::new(45.52, -122.68)));
        assert_eq!(state.zoom, Some(13.0));
        let got: Vec<&str> = state.filters.selected(FilterKey::Products).collect();
        assert_eq!(got, vec!["dairy", "eggs"]);
    }

    #[test]
    fn malformed_values_are_ignored() {
        let state = parse_query_pairs([("lat", "north"), ("lng", "-122.68"), ("zoom", "inf")]);
        assert_eq!(state.center, None);
        assert_eq!(state.zoom, None);
    }

    #[test]
    fn invalid_center_is_not_seeded() {
        let state = parse_query_pairs([("lat", "0"), ("lng", "0")]);
        assert_eq!(state.center, None);
    }

    #[test]
    fn writeback_round_trips() {
        let state = parse_query_pairs([
            ("lat", "45.52000"),
            ("lng", "-122.68000"),
            ("zoom", "12.5"),
            ("practices", "organic"),
        ]);
        let pairs = to_query_pairs(state.center, state.zoom, &state.filters);
        let borrowed: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let again = parse_query_pairs(borrowed);
        assert_eq!(again, state);
    }
}
