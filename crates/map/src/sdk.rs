use geo::LatLng;
use listings::ListingId;

use crate::cluster::ClusterId;

/// Stable identity for one marker on the map surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkerKey {
    /// An unclustered listing marker.
    Listing(ListingId),
    /// A cluster marker.
    Cluster(ClusterId),
    /// A temporary fanned-out marker owned by a spiderfy expansion.
    Spider(ListingId),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MarkerKind {
    Listing { available: bool },
    Cluster { count: usize },
    Spider { appear_delay_ms: u64 },
}

/// Everything the SDK needs to place (or re-place) one marker.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerSpec {
    pub key: MarkerKey,
    pub position: LatLng,
    pub kind: MarkerKind,
}

/// The map rendering SDK, reduced to the primitives this engine uses.
///
/// The engine never depends on SDK-internal rendering. Implementations must
/// tolerate calls for unknown keys (`remove_marker`, `set_emphasis`,
/// `close_popup`) as no-ops, since interaction state can reference listings
/// that are currently folded into a cluster.
pub trait MapSdk {
    /// Style loaded, container attached, instance not mid-teardown.
    ///
    /// While this is `false` the reconciler skips the pass and retries on
    /// the next one instead of erroring.
    fn is_ready(&self) -> bool;

    /// Creates the marker, its popup, and its event bindings.
    fn add_marker(&mut self, spec: &MarkerSpec);

    /// Moves/restyles an existing marker in place (no recreate).
    fn update_marker(&mut self, spec: &MarkerSpec);

    /// Unbinds event handlers, then detaches and disposes the marker.
    fn remove_marker(&mut self, key: MarkerKey);

    /// Scale/shadow emphasis for hover highlighting.
    fn set_emphasis(&mut self, key: MarkerKey, emphasized: bool);

    fn open_popup(&mut self, key: MarkerKey);

    fn close_popup(&mut self, key: MarkerKey);

    /// Programmatic viewport jump (cluster zoom, search selection).
    fn jump_to(&mut self, center: LatLng, zoom: f64);
}
