use geo::LatLng;
use listings::{
    FetchDisposition, FetchOrchestrator, FetchResponse, FetchStatus, FilterKey, FilterSet,
    ListingId, ListingStore, PageRequest, RequestToken, ServiceError, parse_query_pairs,
    to_query_pairs,
};
use runtime::{Debouncer, Event, EventBus, Tick};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::{ClusterClickAction, ClusterId, ClusterParams, Clustered, cluster_listings};
use crate::interaction::{
    InteractionConfig, InteractionState, InteractionSynchronizer, ListCommand,
};
use crate::markers::MarkerLifecycleManager;
use crate::sdk::{MapSdk, MarkerKey, MarkerKind, MarkerSpec};
use crate::spiderfy::{Spiderfy, SpiderfyParams, fan_out};
use crate::viewport::{ViewportConfig, ViewportController};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub viewport: ViewportConfig,
    pub cluster: ClusterParams,
    pub spiderfy: SpiderfyParams,
    pub interaction: InteractionConfig,
    /// Quiet window after the last filter change before the page-1
    /// refetch fires.
    pub filter_debounce_ms: u64,
    pub initial_center: LatLng,
    pub initial_zoom: f64,
    pub width_px: f64,
    pub height_px: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            cluster: ClusterParams::default(),
            spiderfy: SpiderfyParams::default(),
            interaction: InteractionConfig::default(),
            filter_debounce_ms: 500,
            initial_center: LatLng::new(45.5152, -122.6784),
            initial_zoom: 12.0,
            width_px: 1280.0,
            height_px: 800.0,
        }
    }
}

/// The engine facade: owns every component and routes data one way for
/// fetching (viewport/filters → orchestrator → store → clusters →
/// markers → SDK) and both ways for interaction.
///
/// Hosts drive it from their event loop:
/// - forward SDK movement/click events,
/// - call [`Session::tick`] each frame,
/// - drain [`Session::take_requests`], run the transport, and hand
///   results back through [`Session::complete_fetch`] (in any order —
///   stale deliveries are discarded by token).
pub struct Session<S: MapSdk> {
    sdk: S,
    viewport: ViewportController,
    filters: FilterSet,
    filter_debounce: Debouncer,
    orchestrator: FetchOrchestrator,
    store: ListingStore,
    cluster_params: ClusterParams,
    spiderfy_params: SpiderfyParams,
    clustered: Clustered,
    spiderfy: Option<Spiderfy>,
    markers: MarkerLifecycleManager,
    interaction: InteractionSynchronizer,
    bus: EventBus,
    pending_out: Vec<PageRequest>,
    url_update: Option<Vec<(String, String)>>,
}

impl<S: MapSdk> Session<S> {
    pub fn new(config: SessionConfig, sdk: S) -> Self {
        let viewport = ViewportController::new(
            config.viewport,
            config.initial_center,
            config.initial_zoom,
            config.width_px,
            config.height_px,
        );
        Self {
            sdk,
            viewport,
            filters: FilterSet::new(),
            filter_debounce: Debouncer::new(config.filter_debounce_ms),
            orchestrator: FetchOrchestrator::new(),
            store: ListingStore::new(),
            cluster_params: config.cluster,
            spiderfy_params: config.spiderfy,
            clustered: Clustered::default(),
            spiderfy: None,
            markers: MarkerLifecycleManager::new(),
            interaction: InteractionSynchronizer::new(config.interaction),
            bus: EventBus::new(),
            pending_out: Vec::new(),
            url_update: None,
        }
    }

    // --- mount / URL state ---------------------------------------------

    /// Applies `lat`/`lng`/`zoom` and filter values from URL query pairs.
    /// Call before the first [`Session::refresh`].
    pub fn seed_from_query<'a>(&mut self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let state = parse_query_pairs(pairs);
        if let Some(center) = state.center {
            self.viewport.set_coordinates(center);
        }
        if let Some(zoom) = state.zoom {
            self.viewport.set_zoom(zoom);
        }
        if !state.filters.is_empty() {
            self.filters = state.filters;
        }
    }

    /// Current viewport + filters as URL query pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        to_query_pairs(
            Some(self.viewport.center()),
            Some(self.viewport.zoom()),
            &self.filters,
        )
    }

    /// Set after programmatic viewport changes; the host writes it back
    /// to the location bar.
    pub fn take_url_update(&mut self) -> Option<Vec<(String, String)>> {
        self.url_update.take()
    }

    // --- fetching -------------------------------------------------------

    /// Issues a page-1 replace fetch for the current bounds + filters.
    pub fn refresh(&mut self) {
        self.begin_fetch(1, false);
    }

    /// Infinite-scroll trigger: appends the next page while one exists.
    pub fn load_more(&mut self) {
        if self.store.is_loading() || !self.store.has_more() {
            return;
        }
        self.begin_fetch(self.store.page() + 1, true);
    }

    fn begin_fetch(&mut self, page: u32, append: bool) {
        let req = self.orchestrator.begin(
            &mut self.store,
            page,
            Some(self.viewport.bounds()),
            self.filters.clone(),
            append,
        );
        self.pending_out.push(req);
    }

    /// Requests awaiting transport, in issue order.
    pub fn take_requests(&mut self) -> Vec<PageRequest> {
        std::mem::take(&mut self.pending_out)
    }

    /// Delivers a transport outcome; stale tokens are discarded.
    pub fn complete_fetch(
        &mut self,
        token: RequestToken,
        outcome: Result<FetchResponse, ServiceError>,
        now: Tick,
    ) -> FetchDisposition {
        let disposition = self
            .orchestrator
            .complete(&mut self.store, token, outcome, now, &mut self.bus);
        if matches!(disposition, FetchDisposition::Applied { .. }) {
            self.rebuild(now);
        }
        disposition
    }

    pub fn fetch_status(&self) -> FetchStatus {
        self.orchestrator.status()
    }

    // --- map events -----------------------------------------------------

    pub fn on_move_start(&mut self, now: Tick) {
        self.viewport.on_move_start(now);
    }

    pub fn on_move(&mut self, now: Tick, center: LatLng, zoom: f64) {
        self.viewport.on_move(now, center, zoom);
    }

    pub fn on_move_end(&mut self, now: Tick) {
        self.viewport.on_move_end(now);
    }

    /// Frame pump: settle detection, debounced filter refetch, transient
    /// highlight expiry, and one marker reconciliation pass.
    pub fn tick(&mut self, now: Tick) {
        if let Some(settle) = self.viewport.poll(now) {
            debug!(zoom = settle.zoom, "viewport settled, refetching");
            self.begin_fetch(1, false);
            self.rebuild(now);
        }
        if self.filter_debounce.poll(now) {
            self.begin_fetch(1, false);
        }
        self.interaction.tick(now);
        self.sync_markers(now);
    }

    /// Programmatic viewport jump (search selection). Never counted as
    /// user movement; issues its own refetch and a URL writeback.
    pub fn jump_to(&mut self, center: LatLng, zoom: f64, now: Tick) {
        self.sdk.jump_to(center, zoom);
        self.viewport.set_coordinates(center);
        self.viewport.set_zoom(zoom);
        self.url_update = Some(self.query_pairs());
        self.begin_fetch(1, false);
        self.rebuild(now);
    }

    // --- filters --------------------------------------------------------

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Replaces the selection for one key; the page-1 refetch fires once
    /// changes have been quiet for the filter debounce window.
    pub fn set_filter_values<I, V>(&mut self, key: FilterKey, values: I, now: Tick)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.filters.set_values(key, values);
        self.filter_debounce.kick(now);
    }

    // --- clusters & spiderfy --------------------------------------------

    pub fn clustered(&self) -> &Clustered {
        &self.clustered
    }

    pub fn spiderfy(&self) -> Option<&Spiderfy> {
        self.spiderfy.as_ref()
    }

    /// Cluster marker click: toggle spiderfy for small clusters, zoom in
    /// for larger ones.
    pub fn click_cluster(&mut self, id: ClusterId, now: Tick) {
        if self.spiderfy.as_ref().is_some_and(|s| s.cluster == id) {
            self.spiderfy = None;
            self.sync_markers(now);
            return;
        }

        let Some(cluster) = self.clustered.cluster(id).cloned() else {
            return;
        };

        match cluster.click_action(self.viewport.zoom()) {
            ClusterClickAction::Spiderfy => {
                self.spiderfy = Some(fan_out(
                    &cluster,
                    &self.store,
                    self.viewport.zoom(),
                    &self.spiderfy_params,
                ));
                self.sync_markers(now);
            }
            ClusterClickAction::ZoomIn { zoom, center } => {
                self.spiderfy = None;
                self.jump_to(center, zoom, now);
            }
        }
    }

    /// Fanned-marker click: collapse, select, scroll the row into view.
    pub fn click_spider_leg(&mut self, id: ListingId, now: Tick) {
        self.spiderfy = None;
        self.interaction.select(id, now, &mut self.sdk);
        self.sync_markers(now);
    }

    // --- interaction ----------------------------------------------------

    pub fn interaction_state(&self) -> InteractionState {
        self.interaction.state()
    }

    pub fn hover_row(&mut self, id: Option<ListingId>) {
        self.interaction.hover_from_list(id, &mut self.sdk);
    }

    pub fn hover_marker(&mut self, id: Option<ListingId>) {
        self.interaction.hover_from_map(id, &mut self.sdk);
    }

    pub fn click_row(&mut self, id: ListingId, now: Tick) {
        self.interaction.select(id, now, &mut self.sdk);
    }

    pub fn click_marker(&mut self, id: ListingId, now: Tick) {
        self.interaction.select(id, now, &mut self.sdk);
    }

    /// Map background click: collapse any spiderfy, clear selection.
    pub fn click_background(&mut self, now: Tick) {
        self.spiderfy = None;
        self.interaction.clear_selection(&mut self.sdk);
        self.sync_markers(now);
    }

    pub fn drain_list_commands(&mut self) -> Vec<ListCommand> {
        self.interaction.drain_commands()
    }

    // --- state access ---------------------------------------------------

    pub fn store(&self) -> &ListingStore {
        &self.store
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    pub fn sdk_mut(&mut self) -> &mut S {
        &mut self.sdk
    }

    pub fn markers(&self) -> &MarkerLifecycleManager {
        &self.markers
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }

    pub fn diagnostics(&self) -> &EventBus {
        &self.bus
    }

    /// Releases every SDK resource. Uses the same disposal path as
    /// reconciliation, so a teardown after any partial update sequence
    /// neither leaks nor double-frees.
    pub fn teardown(&mut self) {
        self.spiderfy = None;
        self.interaction.clear_selection(&mut self.sdk);
        self.markers.teardown(&mut self.sdk);
    }

    // --- internals ------------------------------------------------------

    /// Recomputes visible → clusters → markers after any store or
    /// viewport change. Clusters move under recomputation, so an open
    /// spiderfy is collapsed here.
    fn rebuild(&mut self, now: Tick) {
        let bounds = self.viewport.bounds();
        self.store.compute_visible(&bounds);
        self.clustered = cluster_listings(
            self.store.visible_listings(),
            self.viewport.zoom(),
            &self.cluster_params,
        );
        self.spiderfy = None;
        self.sync_markers(now);
    }

    fn sync_markers(&mut self, now: Tick) {
        let desired = self.desired_markers();
        self.markers
            .reconcile(&desired, &mut self.sdk, now, &mut self.bus);
    }

    fn desired_markers(&self) -> Vec<MarkerSpec> {
        let mut specs = Vec::with_capacity(self.clustered.marker_count());
        for cluster in &self.clustered.clusters {
            specs.push(MarkerSpec {
                key: MarkerKey::Cluster(cluster.id),
                position: cluster.centroid,
                kind: MarkerKind::Cluster {
                    count: cluster.count(),
                },
            });
        }
        for id in &self.clustered.single {
            let Some(listing) = self.store.get(*id) else {
                continue;
            };
            specs.push(MarkerSpec {
                key: MarkerKey::Listing(*id),
                position: listing.position(),
                kind: MarkerKind::Listing {
                    available: listing.available,
                },
            });
        }
        if let Some(spider) = &self.spiderfy {
            for leg in &spider.legs {
                specs.push(MarkerSpec {
                    key: MarkerKey::Spider(leg.listing),
                    position: leg.position,
                    kind: MarkerKind::Spider {
                        appear_delay_ms: leg.appear_delay_ms,
                    },
                });
            }
        }
        specs
    }
}
