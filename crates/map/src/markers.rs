use std::collections::BTreeMap;

use runtime::{EventBus, Tick};
use tracing::{debug, warn};

use crate::sdk::{MapSdk, MarkerKey, MarkerSpec};

/// Result of one reconciliation pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// The SDK was not ready; nothing was touched, retry next pass.
    pub skipped: bool,
}

/// Sole owner of live SDK marker objects.
///
/// Every create/update/destroy goes through one diff pass per frame
/// against the desired set, so no other component ever touches SDK marker
/// state directly:
/// - keys present now but absent previously are created,
/// - keys absent now but present previously are disposed,
/// - keys present in both are left alone unless their spec changed
///   (updated in place, never recreated).
#[derive(Debug, Default)]
pub struct MarkerLifecycleManager {
    live: BTreeMap<MarkerKey, MarkerSpec>,
}

impl MarkerLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_keys(&self) -> impl Iterator<Item = MarkerKey> + '_ {
        self.live.keys().copied()
    }

    pub fn is_live(&self, key: MarkerKey) -> bool {
        self.live.contains_key(&key)
    }

    /// Diffs `desired` against the live set and applies the difference.
    ///
    /// Specs with invalid coordinates are dropped with a diagnostic and
    /// never placed. When the SDK is not ready (style loading, container
    /// detached, mid-teardown) the pass is skipped wholesale and retried
    /// on the next call.
    pub fn reconcile(
        &mut self,
        desired: &[MarkerSpec],
        sdk: &mut dyn MapSdk,
        now: Tick,
        bus: &mut EventBus,
    ) -> ReconcileSummary {
        if !sdk.is_ready() {
            debug!("map sdk not ready, skipping marker reconciliation");
            return ReconcileSummary {
                skipped: true,
                ..ReconcileSummary::default()
            };
        }

        let mut target: BTreeMap<MarkerKey, MarkerSpec> = BTreeMap::new();
        for spec in desired {
            if let Err(err) = spec.position.validate() {
                warn!(key = ?spec.key, %err, "dropping marker with invalid coordinates");
                bus.emit(
                    now,
                    "coordinate_dropped",
                    format!("marker {:?}: {err}", spec.key),
                );
                continue;
            }
            target.insert(spec.key, *spec);
        }

        let mut summary = ReconcileSummary::default();

        let stale: Vec<MarkerKey> = self
            .live
            .keys()
            .filter(|k| !target.contains_key(k))
            .copied()
            .collect();
        for key in stale {
            self.dispose(key, sdk);
            summary.removed += 1;
        }

        for (key, spec) in target {
            match self.live.get(&key) {
                None => {
                    sdk.add_marker(&spec);
                    self.live.insert(key, spec);
                    summary.created += 1;
                }
                Some(prev) if *prev != spec => {
                    sdk.update_marker(&spec);
                    self.live.insert(key, spec);
                    summary.updated += 1;
                }
                Some(_) => {}
            }
        }

        summary
    }

    /// Releases every live marker.
    ///
    /// Uses the same disposal path as reconciliation removal, so teardown
    /// after a partial diff can neither double-free nor leak.
    pub fn teardown(&mut self, sdk: &mut dyn MapSdk) {
        let keys: Vec<MarkerKey> = self.live.keys().copied().collect();
        for key in keys {
            self.dispose(key, sdk);
        }
    }

    fn dispose(&mut self, key: MarkerKey, sdk: &mut dyn MapSdk) {
        // The SDK unbinds event handlers before detaching the marker.
        sdk.remove_marker(key);
        self.live.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::MarkerLifecycleManager;
    use crate::sdk::{MarkerKey, MarkerKind, MarkerSpec};
    use crate::test_sdk::RecordingSdk;
    use geo::LatLng;
    use listings::ListingId;
    use runtime::{EventBus, Tick};

    fn listing_marker(id: u64, lat: f64, lng: f64) -> MarkerSpec {
        MarkerSpec {
            key: MarkerKey::Listing(ListingId(id)),
            position: LatLng::new(lat, lng),
            kind: MarkerKind::Listing { available: true },
        }
    }

    #[test]
    fn creates_removes_and_keeps_markers() {
        let mut mgr = MarkerLifecycleManager::new();
        let mut sdk = RecordingSdk::ready();
        let mut bus = EventBus::new();

        let a = listing_marker(1, 45.0, -122.0);
        let b = listing_marker(2, 45.1, -122.1);
        let c = listing_marker(3, 45.2, -122.2);

        let s1 = mgr.reconcile(&[a, b], &mut sdk, Tick(0), &mut bus);
        assert_eq!((s1.created, s1.removed), (2, 0));

        let s2 = mgr.reconcile(&[b, c], &mut sdk, Tick(1), &mut bus);
        assert_eq!((s2.created, s2.removed), (1, 1));

        // b survived both passes without being recreated.
        assert_eq!(sdk.adds, 3);
        assert_eq!(sdk.removes, 1);
        assert_eq!(mgr.live_count(), 2);
        assert_eq!(sdk.live.len(), 2);
    }

    #[test]
    fn changed_spec_updates_in_place() {
        let mut mgr = MarkerLifecycleManager::new();
        let mut sdk = RecordingSdk::ready();
        let mut bus = EventBus::new();

        let before = listing_marker(1, 45.0, -122.0);
        mgr.reconcile(&[before], &mut sdk, Tick(0), &mut bus);

        let mut after = before;
        after.kind = MarkerKind::Listing { available: false };
        let s = mgr.reconcile(&[after], &mut sdk, Tick(1), &mut bus);

        assert_eq!((s.created, s.updated, s.removed), (0, 1, 0));
        assert_eq!(sdk.adds, 1);
        assert_eq!(sdk.updates, 1);
    }

    #[test]
    fn invalid_coordinates_never_reach_the_sdk() {
        let mut mgr = MarkerLifecycleManager::new();
        let mut sdk = RecordingSdk::ready();
        let mut bus = EventBus::new();

        let good = listing_marker(1, 45.0, -122.0);
        let null_island = listing_marker(2, 0.0, 0.0);
        let nan = listing_marker(3, f64::NAN, -122.0);

        mgr.reconcile(&[good, null_island, nan], &mut sdk, Tick(0), &mut bus);

        assert_eq!(mgr.live_count(), 1);
        assert_eq!(sdk.live.len(), 1);
        assert_eq!(bus.count_kind("coordinate_dropped"), 2);
    }

    #[test]
    fn not_ready_skips_and_retries() {
        let mut mgr = MarkerLifecycleManager::new();
        let mut sdk = RecordingSdk::default();
        let mut bus = EventBus::new();

        let a = listing_marker(1, 45.0, -122.0);
        let s = mgr.reconcile(&[a], &mut sdk, Tick(0), &mut bus);
        assert!(s.skipped);
        assert_eq!(mgr.live_count(), 0);
        assert_eq!(sdk.adds, 0);

        sdk.ready = true;
        let s = mgr.reconcile(&[a], &mut sdk, Tick(1), &mut bus);
        assert!(!s.skipped);
        assert_eq!(s.created, 1);
    }

    #[test]
    fn teardown_releases_everything_once() {
        let mut mgr = MarkerLifecycleManager::new();
        let mut sdk = RecordingSdk::ready();
        let mut bus = EventBus::new();

        mgr.reconcile(
            &[listing_marker(1, 45.0, -122.0), listing_marker(2, 45.1, -122.1)],
            &mut sdk,
            Tick(0),
            &mut bus,
        );
        mgr.teardown(&mut sdk);

        assert_eq!(mgr.live_count(), 0);
        assert!(sdk.live.is_empty());
        assert_eq!(sdk.removes, 2);

        // A second teardown is a no-op, not a double-free.
        mgr.teardown(&mut sdk);
        assert_eq!(sdk.removes, 2);
    }
}
