use crate::bounds::GeoBounds;
use crate::latlng::LatLng;

/// Web Mercator tile edge in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude where the Web Mercator projection is cut off.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_6;

/// Position in world-pixel space at some zoom level.
///
/// The world is `TILE_SIZE * 2^zoom` pixels on a side; y grows southward.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: PixelPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Projects a geographic position to world-pixel space at `zoom`.
///
/// Latitude is clamped to the Mercator cut so poles stay representable.
pub fn project(p: LatLng, zoom: f64) -> PixelPoint {
    let size = world_size(zoom);
    let lat = p.lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
    let x = (p.lng + 180.0) / 360.0 * size;
    let phi = lat.to_radians();
    let y = (1.0 - (phi.tan() + 1.0 / phi.cos()).ln() / std::f64::consts::PI) / 2.0 * size;
    PixelPoint::new(x, y)
}

/// Inverse of [`project`].
pub fn unproject(p: PixelPoint, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = p.x / size * 360.0 - 180.0;
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * p.y / size;
    let lat = (0.5 * (n.exp() - (-n).exp())).atan().to_degrees();
    LatLng::new(lat, wrap_lng(lng))
}

/// Normalizes a longitude into [-180, 180].
pub fn wrap_lng(lng: f64) -> f64 {
    let mut l = (lng + 180.0) % 360.0;
    if l < 0.0 {
        l += 360.0;
    }
    l - 180.0
}

/// Geographic extent of a `width_px × height_px` viewport centered on
/// `center` at `zoom`.
///
/// A viewport wider than the world yields `west > east` (antimeridian
/// wrap), which [`GeoBounds::contains`] handles.
pub fn viewport_bounds(center: LatLng, zoom: f64, width_px: f64, height_px: f64) -> GeoBounds {
    let size = world_size(zoom);
    let c = project(center, zoom);

    let top = (c.y - height_px / 2.0).max(0.0);
    let bottom = (c.y + height_px / 2.0).min(size);
    let nw = unproject(PixelPoint::new(c.x - width_px / 2.0, top), zoom);
    let se = unproject(PixelPoint::new(c.x + width_px / 2.0, bottom), zoom);

    GeoBounds::new(nw.lat, se.lat, se.lng, nw.lng)
}

#[cfg(test)]
mod tests {
    use super::{PixelPoint, TILE_SIZE, project, unproject, viewport_bounds, wrap_lng};
    use crate::latlng::LatLng;

    #[test]
    fn equator_meridian_is_world_center() {
        let p = project(LatLng::new(0.0, 0.0), 0.0);
        assert!((p.x - TILE_SIZE / 2.0).abs() < 1e-9);
        assert!((p.y - TILE_SIZE / 2.0).abs() < 1e-9);
    }

    #[test]
    fn project_unproject_round_trip() {
        let orig = LatLng::new(45.52, -122.68);
        let back = unproject(project(orig, 12.0), 12.0);
        assert!((back.lat - orig.lat).abs() < 1e-9);
        assert!((back.lng - orig.lng).abs() < 1e-9);
    }

    #[test]
    fn pixel_distance() {
        let a = PixelPoint::new(0.0, 0.0);
        let b = PixelPoint::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn viewport_bounds_contain_center() {
        let center = LatLng::new(45.52, -122.68);
        let b = viewport_bounds(center, 12.0, 1024.0, 768.0);
        assert!(b.contains(center));
        assert!(b.north > center.lat && b.south < center.lat);
    }

    #[test]
    fn wrap_normalizes_longitudes() {
        assert!((wrap_lng(190.0) + 170.0).abs() < 1e-9);
        assert!((wrap_lng(-190.0) - 170.0).abs() < 1e-9);
        assert!((wrap_lng(45.0) - 45.0).abs() < 1e-9);
    }
}
