use std::env;
use std::fs;

use geo::LatLng;
use listings::{
    FetchRequest, FetchResponse, FilterKey, Listing, ListingService, PageRequest, ServiceError,
};
use map::{MapSdk, MarkerKind, MarkerSpec, MarkerKey, Session, SessionConfig};
use runtime::Tick;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Scripted run of the listing map engine against an in-memory data
/// service and a logging map SDK.
///
/// Set `LISTINGS_PATH` to a JSON array of listings to use your own data;
/// `RUST_LOG=debug` shows engine internals.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let listings = load_listings();
    info!(count = listings.len(), "loaded listings");

    let mut service = InMemoryService { listings };
    let mut session = Session::new(SessionConfig::default(), ConsoleSdk { ready: true });

    // Seed the viewport the way a share link would.
    session.seed_from_query([("lat", "45.5152"), ("lng", "-122.6784"), ("zoom", "12")]);
    session.refresh();
    let mut now = Tick(0);
    pump(&mut session, &mut service, &mut now);
    report(&mut session, "initial load");

    // User pans north-east, then the viewport settles.
    session.on_move_start(now);
    now = now.plus_ms(80);
    session.on_move(now, LatLng::new(45.56, -122.62), 12.0);
    now = now.plus_ms(40);
    session.on_move_end(now);
    now = now.plus_ms(400);
    pump(&mut session, &mut service, &mut now);
    report(&mut session, "after pan");

    // Filter down to organic producers (debounced refetch).
    session.set_filter_values(FilterKey::Practices, ["organic"], now);
    now = now.plus_ms(600);
    pump(&mut session, &mut service, &mut now);
    report(&mut session, "after filter");

    // Open the first small cluster, if any.
    if let Some(cluster) = session
        .clustered()
        .clusters
        .iter()
        .find(|c| c.count() <= 5)
        .cloned()
    {
        session.click_cluster(cluster.id, now);
        let fanned = session
            .spiderfy()
            .and_then(|s| s.legs.first().map(|leg| (s.legs.len(), leg.listing)));
        if let Some((legs, first)) = fanned {
            info!(legs, "spiderfied cluster {:?}", cluster.id);
            session.click_spider_leg(first, now);
            info!(?first, "selected fanned listing");
        }
    }

    for cmd in session.drain_list_commands() {
        info!(?cmd, "list command");
    }
    for event in session.drain_events() {
        info!(kind = event.kind, at = event.at.ms(), "{}", event.message);
    }

    session.teardown();
}

/// Runs ticks and the synchronous "transport" until the session is idle.
fn pump(session: &mut Session<ConsoleSdk>, service: &mut InMemoryService, now: &mut Tick) {
    loop {
        session.tick(*now);
        let requests = session.take_requests();
        if requests.is_empty() {
            break;
        }
        for PageRequest { token, request, .. } in requests {
            let outcome = service.fetch(&request);
            session.complete_fetch(token, outcome, *now);
        }
        *now = now.plus_ms(16);
    }
}

fn report(session: &mut Session<ConsoleSdk>, stage: &str) {
    info!(
        stage,
        visible = session.store().visible_ids().len(),
        clusters = session.clustered().clusters.len(),
        single = session.clustered().single.len(),
        status = ?session.fetch_status(),
        "engine state"
    );
}

fn load_listings() -> Vec<Listing> {
    let raw = match env::var("LISTINGS_PATH") {
        Ok(path) => match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(%path, %err, "could not read LISTINGS_PATH, using sample data");
                SAMPLE_LISTINGS.to_string()
            }
        },
        Err(_) => SAMPLE_LISTINGS.to_string(),
    };

    match serde_json::from_str(&raw) {
        Ok(listings) => listings,
        Err(err) => {
            warn!(%err, "listing data did not parse, starting empty");
            Vec::new()
        }
    }
}

/// Serves the loaded listings with bounds, tag-filter, and pagination
/// semantics matching the remote data service contract.
struct InMemoryService {
    listings: Vec<Listing>,
}

impl ListingService for InMemoryService {
    fn fetch(&mut self, req: &FetchRequest) -> Result<FetchResponse, ServiceError> {
        let wanted: Vec<&str> = FilterKey::ALL
            .iter()
            .flat_map(|k| req.filters.selected(*k))
            .collect();

        let matching: Vec<Listing> = self
            .listings
            .iter()
            .filter(|l| match req.bounds {
                Some(b) => b.contains(l.position()),
                None => true,
            })
            .filter(|l| {
                wanted.is_empty() || wanted.iter().any(|w| l.tags.iter().any(|t| t == w))
            })
            .cloned()
            .collect();

        let start = ((req.page.max(1) - 1) * req.page_size) as usize;
        let end = (start + req.page_size as usize).min(matching.len());
        let items = if start < matching.len() {
            matching[start..end].to_vec()
        } else {
            Vec::new()
        };

        Ok(FetchResponse {
            has_more: end < matching.len(),
            items,
        })
    }
}

/// Map SDK stand-in that logs marker lifecycle calls.
struct ConsoleSdk {
    ready: bool,
}

impl MapSdk for ConsoleSdk {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn add_marker(&mut self, spec: &MarkerSpec) {
        match spec.kind {
            MarkerKind::Cluster { count } => {
                info!(key = ?spec.key, count, "add cluster marker");
            }
            _ => info!(key = ?spec.key, "add marker"),
        }
    }

    fn update_marker(&mut self, spec: &MarkerSpec) {
        info!(key = ?spec.key, "update marker");
    }

    fn remove_marker(&mut self, key: MarkerKey) {
        info!(?key, "remove marker");
    }

    fn set_emphasis(&mut self, key: MarkerKey, emphasized: bool) {
        info!(?key, emphasized, "marker emphasis");
    }

    fn open_popup(&mut self, key: MarkerKey) {
        info!(?key, "open popup");
    }

    fn close_popup(&mut self, key: MarkerKey) {
        info!(?key, "close popup");
    }

    fn jump_to(&mut self, center: LatLng, zoom: f64) {
        info!(lat = center.lat, lng = center.lng, zoom, "jump viewport");
    }
}

const SAMPLE_LISTINGS: &str = r#"[
  {"id": 1, "name": "Sauvie Greens", "address": "Sauvie Island, OR", "tags": ["produce", "organic"], "lat": 45.5231, "lng": -122.6843},
  {"id": 2, "name": "Hazel Hill Farm", "address": "NE Portland, OR", "tags": ["produce"], "lat": 45.5228, "lng": -122.6840},
  {"id": 3, "name": "Creekside Dairy", "address": "NE Portland, OR", "tags": ["dairy", "organic"], "lat": 45.5234, "lng": -122.6847},
  {"id": 4, "name": "Stonebarn Orchard", "address": "SE Portland, OR", "tags": ["fruit"], "lat": 45.4970, "lng": -122.6102},
  {"id": 5, "name": "Willow Creek Eggs", "address": "Beaverton, OR", "tags": ["eggs", "organic"], "lat": 45.4870, "lng": -122.8030},
  {"id": 6, "name": "Legacy Row Crops", "address": "Vancouver, WA", "tags": ["produce"], "lat": 45.6387, "lng": -122.6615},
  {"id": 7, "name": "Misty Hollow Creamery", "address": "Hillsboro, OR", "lat": "45.5229", "lng": "-122.9898", "tags": ["dairy"]},
  {"id": 8, "name": "Broken Pin Ranch", "address": "unknown", "tags": ["meat"], "lat": 0.0, "lng": 0.0}
]"#;
