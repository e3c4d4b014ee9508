use std::collections::BTreeMap;

use geo::GeoBounds;
use runtime::{EventBus, Tick};
use tracing::{debug, warn};

use crate::filters::FilterSet;
use crate::service::{FetchRequest, FetchResponse, ServiceError};
use crate::store::ListingStore;

/// Strictly increasing sequence token attached to every outgoing fetch.
///
/// Correctness under overlapping fetches rests entirely on this token:
/// whatever request was issued last wins, everything older is discarded on
/// arrival. There is no locking and no transport-level abort.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// An issued page request, ready to hand to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub token: RequestToken,
    pub request: FetchRequest,
    pub append: bool,
}

/// Observable fetch state, for loading affordances and notifications.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success { count: usize },
    Empty,
    Failed,
}

/// What [`FetchOrchestrator::complete`] did with a delivered outcome.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    /// Applied to the store; `added` counts listings that entered it.
    Applied { added: usize, appended: bool },
    /// Superseded by a newer token; unconditionally ignored.
    Stale,
    /// Service failure; the store keeps its last-good contents.
    Failed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Pending {
    page: u32,
    append: bool,
}

/// Issues tokened page requests and applies their outcomes to the store.
#[derive(Debug, Default)]
pub struct FetchOrchestrator {
    next_token: u64,
    latest: Option<RequestToken>,
    pending: BTreeMap<RequestToken, Pending>,
    status: FetchStatus,
}

impl FetchOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Issues a request for `page`. `append=false` will replace the store's
    /// full set on completion; `append=true` merges by id union.
    pub fn begin(
        &mut self,
        store: &mut ListingStore,
        page: u32,
        bounds: Option<GeoBounds>,
        filters: FilterSet,
        append: bool,
    ) -> PageRequest {
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.latest = Some(token);
        self.pending.insert(token, Pending { page, append });
        self.status = FetchStatus::Loading;
        store.set_loading(true);

        let mut request = FetchRequest::page_one(bounds, filters);
        request.page = page;
        debug!(token = token.0, page, append, "issuing listing fetch");

        PageRequest {
            token,
            request,
            append,
        }
    }

    /// Delivers a transport outcome for `token`.
    ///
    /// Stale deliveries (any token other than the latest issued) are
    /// discarded without touching the store; replace/append is atomic from
    /// the caller's perspective because nothing is written on failure.
    pub fn complete(
        &mut self,
        store: &mut ListingStore,
        token: RequestToken,
        outcome: Result<FetchResponse, ServiceError>,
        now: Tick,
        bus: &mut EventBus,
    ) -> FetchDisposition {
        let Some(pending) = self.pending.remove(&token) else {
            // Unknown or already-handled token; nothing to do.
            return FetchDisposition::Stale;
        };

        if self.latest != Some(token) {
            debug!(token = token.0, "discarding stale fetch response");
            bus.emit(
                now,
                "stale_response",
                format!("token {} superseded", token.0),
            );
            return FetchDisposition::Stale;
        }

        store.set_loading(false);

        match outcome {
            Ok(resp) => {
                let fetched = resp.items.len();
                let added = if pending.append {
                    store.append_page(resp.items, now, bus)
                } else {
                    store.set_all(resp.items, now, bus)
                };
                store.set_page(pending.page);
                store.set_has_more(resp.has_more);
                self.status = if fetched == 0 {
                    FetchStatus::Empty
                } else {
                    FetchStatus::Success { count: fetched }
                };
                FetchDisposition::Applied {
                    added,
                    appended: pending.append,
                }
            }
            Err(err) => {
                warn!(token = token.0, %err, "listing fetch failed");
                bus.emit(now, "fetch_failed", err.to_string());
                self.status = FetchStatus::Failed;
                FetchDisposition::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchDisposition, FetchOrchestrator, FetchStatus};
    use crate::filters::FilterSet;
    use crate::listing::{Listing, ListingId};
    use crate::service::{FetchResponse, ServiceError};
    use crate::store::ListingStore;
    use runtime::{EventBus, Tick};

    fn farm(id: u64) -> Listing {
        Listing {
            id: ListingId(id),
            name: format!("farm-{id}"),
            address: String::new(),
            tags: Vec::new(),
            available: true,
            lat: 45.0 + id as f64 * 0.01,
            lng: -122.0,
        }
    }

    fn page(ids: &[u64], has_more: bool) -> FetchResponse {
        FetchResponse {
            items: ids.iter().copied().map(farm).collect(),
            has_more,
        }
    }

    #[test]
    fn stale_response_is_rejected() {
        let mut orch = FetchOrchestrator::new();
        let mut store = ListingStore::new();
        let mut bus = EventBus::new();

        let a = orch.begin(&mut store, 1, None, FilterSet::new(), false);
        let b = orch.begin(&mut store, 1, None, FilterSet::new(), false);

        // B (newer) resolves first, then A arrives late.
        let db = orch.complete(&mut store, b.token, Ok(page(&[10, 11], false)), Tick(5), &mut bus);
        assert!(matches!(db, FetchDisposition::Applied { .. }));
        let da = orch.complete(&mut store, a.token, Ok(page(&[1, 2], false)), Tick(6), &mut bus);
        assert_eq!(da, FetchDisposition::Stale);

        let ids: Vec<ListingId> = store.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![ListingId(10), ListingId(11)]);
        assert_eq!(bus.count_kind("stale_response"), 1);
    }

    #[test]
    fn append_unions_by_id() {
        let mut orch = FetchOrchestrator::new();
        let mut store = ListingStore::new();
        let mut bus = EventBus::new();

        let p1 = orch.begin(&mut store, 1, None, FilterSet::new(), false);
        orch.complete(&mut store, p1.token, Ok(page(&[1, 2, 3], true)), Tick(1), &mut bus);

        let p2 = orch.begin(&mut store, 2, None, FilterSet::new(), true);
        let d = orch.complete(&mut store, p2.token, Ok(page(&[3, 4], false)), Tick(2), &mut bus);

        assert_eq!(d, FetchDisposition::Applied { added: 1, appended: true });
        let ids: Vec<u64> = store.iter().map(|l| l.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(store.page(), 2);
        assert!(!store.has_more());
    }

    #[test]
    fn failure_keeps_last_good_data() {
        let mut orch = FetchOrchestrator::new();
        let mut store = ListingStore::new();
        let mut bus = EventBus::new();

        let p1 = orch.begin(&mut store, 1, None, FilterSet::new(), false);
        orch.complete(&mut store, p1.token, Ok(page(&[1, 2], false)), Tick(1), &mut bus);

        let p2 = orch.begin(&mut store, 1, None, FilterSet::new(), false);
        let d = orch.complete(
            &mut store,
            p2.token,
            Err(ServiceError::Unavailable("timeout".into())),
            Tick(2),
            &mut bus,
        );

        assert_eq!(d, FetchDisposition::Failed);
        assert_eq!(orch.status(), FetchStatus::Failed);
        assert_eq!(store.len(), 2);
        assert!(!store.is_loading());
        assert_eq!(bus.count_kind("fetch_failed"), 1);
    }

    #[test]
    fn empty_result_surfaces_empty_status() {
        let mut orch = FetchOrchestrator::new();
        let mut store = ListingStore::new();
        let mut bus = EventBus::new();

        let p = orch.begin(&mut store, 1, None, FilterSet::new(), false);
        assert_eq!(orch.status(), FetchStatus::Loading);
        assert!(store.is_loading());
        orch.complete(&mut store, p.token, Ok(page(&[], false)), Tick(1), &mut bus);
        assert_eq!(orch.status(), FetchStatus::Empty);
        assert!(!store.is_loading());
    }

    #[test]
    fn success_reports_fetched_count() {
        let mut orch = FetchOrchestrator::new();
        let mut store = ListingStore::new();
        let mut bus = EventBus::new();

        let p = orch.begin(&mut store, 1, None, FilterSet::new(), false);
        orch.complete(&mut store, p.token, Ok(page(&[1, 2, 3], false)), Tick(1), &mut bus);
        assert_eq!(orch.status(), FetchStatus::Success { count: 3 });
    }
}
