use std::collections::BTreeMap;

use geo::GeoBounds;
use runtime::{EventBus, Tick};
use tracing::warn;

use crate::listing::{Listing, ListingId};

/// Canonical holder of fetched listings and the bounds-visible subset.
///
/// Invariants:
/// - ids in `all` are unique (first occurrence wins),
/// - `visible` ⊆ `all`, in `all` insertion order,
/// - listings that fail coordinate validation never enter the store; each
///   drop is logged and recorded as a `coordinate_dropped` event.
#[derive(Debug, Default)]
pub struct ListingStore {
    all: Vec<Listing>,
    index: BTreeMap<ListingId, usize>,
    visible: Vec<ListingId>,
    page: u32,
    has_more: bool,
    loading: bool,
}

impl ListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn get(&self, id: ListingId) -> Option<&Listing> {
        self.index.get(&id).map(|&i| &self.all[i])
    }

    pub fn contains(&self, id: ListingId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listing> {
        self.all.iter()
    }

    /// Replaces the full set. Returns how many listings were accepted.
    pub fn set_all(&mut self, listings: Vec<Listing>, now: Tick, bus: &mut EventBus) -> usize {
        self.all.clear();
        self.index.clear();
        self.visible.clear();
        self.ingest(listings, now, bus)
    }

    /// Merges a page by id union: entries already present are kept as-is,
    /// new ids are appended. Returns how many listings were added.
    pub fn append_page(&mut self, listings: Vec<Listing>, now: Tick, bus: &mut EventBus) -> usize {
        self.ingest(listings, now, bus)
    }

    fn ingest(&mut self, listings: Vec<Listing>, now: Tick, bus: &mut EventBus) -> usize {
        let mut accepted = 0;
        for listing in listings {
            if let Err(err) = listing.validate_position() {
                warn!(id = %listing.id, %err, "dropping listing with invalid coordinates");
                bus.emit(
                    now,
                    "coordinate_dropped",
                    format!("listing {}: {err}", listing.id),
                );
                continue;
            }
            if self.index.contains_key(&listing.id) {
                continue;
            }
            self.index.insert(listing.id, self.all.len());
            self.all.push(listing);
            accepted += 1;
        }
        accepted
    }

    /// Recomputes the visible subset against `bounds`.
    ///
    /// Called on every bounds change and every store mutation.
    pub fn compute_visible(&mut self, bounds: &GeoBounds) {
        self.visible = self
            .all
            .iter()
            .filter(|l| bounds.contains(l.position()))
            .map(|l| l.id)
            .collect();
    }

    pub fn visible_ids(&self) -> &[ListingId] {
        &self.visible
    }

    pub fn visible_listings(&self) -> impl Iterator<Item = &Listing> {
        self.visible.iter().filter_map(|id| self.get(*id))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn set_has_more(&mut self, has_more: bool) {
        self.has_more = has_more;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}
