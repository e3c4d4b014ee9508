use geo::{LatLng, PixelPoint, project, stable_total_cmp_f64, unproject};
use listings::{ListingId, ListingStore};
use serde::{Deserialize, Serialize};

use crate::cluster::{Cluster, ClusterId};

/// Circular fan-out tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiderfyParams {
    /// Fan circle radius in screen pixels.
    #[serde(default = "default_radius_px")]
    pub radius_px: f64,
    /// At most this many members fan out; the rest stay under the cluster.
    #[serde(default = "default_max_legs")]
    pub max_legs: usize,
    /// Per-leg appearance stagger (presentation only).
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
}

fn default_radius_px() -> f64 {
    50.0
}

fn default_max_legs() -> usize {
    8
}

fn default_stagger_ms() -> u64 {
    50
}

impl Default for SpiderfyParams {
    fn default() -> Self {
        Self {
            radius_px: default_radius_px(),
            max_legs: default_max_legs(),
            stagger_ms: default_stagger_ms(),
        }
    }
}

/// One fanned-out marker.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiderLeg {
    pub listing: ListingId,
    pub position: LatLng,
    pub appear_delay_ms: u64,
}

/// An active expansion: which cluster it belongs to and the temporary
/// markers it owns. Lives only until the next toggle, recluster, or
/// teardown.
#[derive(Debug, Clone, PartialEq)]
pub struct Spiderfy {
    pub cluster: ClusterId,
    pub legs: Vec<SpiderLeg>,
}

/// Fans a cluster's members into a circle around its centroid.
///
/// Members are ranked by projected pixel distance to the centroid (ties by
/// id) and the nearest `max_legs` get fan positions, so leg placement is
/// deterministic. Leg `i` of `n` sits at angle `i/n · 2π` on a
/// `radius_px` circle in pixel space, unprojected back to geographic
/// coordinates.
pub fn fan_out(
    cluster: &Cluster,
    store: &ListingStore,
    zoom: f64,
    params: &SpiderfyParams,
) -> Spiderfy {
    let centroid_px = project(cluster.centroid, zoom);

    let mut ranked: Vec<(ListingId, f64)> = cluster
        .members
        .iter()
        .filter_map(|id| store.get(*id))
        .map(|l| {
            let px = project(l.position(), zoom);
            (l.id, centroid_px.distance(px))
        })
        .collect();
    ranked.sort_by(|(ia, da), (ib, db)| {
        stable_total_cmp_f64(*da, *db).then_with(|| ia.cmp(ib))
    });
    ranked.truncate(params.max_legs);

    let n = ranked.len();
    let legs = ranked
        .into_iter()
        .enumerate()
        .map(|(i, (listing, _))| {
            let theta = i as f64 / n as f64 * std::f64::consts::TAU;
            let px = PixelPoint::new(
                centroid_px.x + params.radius_px * theta.cos(),
                centroid_px.y + params.radius_px * theta.sin(),
            );
            SpiderLeg {
                listing,
                position: unproject(px, zoom),
                appear_delay_ms: i as u64 * params.stagger_ms,
            }
        })
        .collect();

    Spiderfy {
        cluster: cluster.id,
        legs,
    }
}

#[cfg(test)]
mod tests {
    use super::{SpiderfyParams, fan_out};
    use crate::cluster::{Cluster, ClusterId};
    use geo::{LatLng, project};
    use listings::{Listing, ListingId, ListingStore};
    use runtime::{EventBus, Tick};

    fn farm(id: u64, lat: f64, lng: f64) -> Listing {
        Listing {
            id: ListingId(id),
            name: format!("farm-{id}"),
            address: String::new(),
            tags: Vec::new(),
            available: true,
            lat,
            lng,
        }
    }

    fn store_with(farms: Vec<Listing>) -> ListingStore {
        let mut store = ListingStore::new();
        let mut bus = EventBus::new();
        store.set_all(farms, Tick(0), &mut bus);
        store
    }

    fn cluster_of(store: &ListingStore, ids: &[u64]) -> Cluster {
        let n = ids.len() as f64;
        let centroid = LatLng::new(
            ids.iter()
                .map(|id| store.get(ListingId(*id)).unwrap().lat)
                .sum::<f64>()
                / n,
            ids.iter()
                .map(|id| store.get(ListingId(*id)).unwrap().lng)
                .sum::<f64>()
                / n,
        );
        Cluster {
            id: ClusterId(ids[0]),
            centroid,
            members: ids.iter().map(|id| ListingId(*id)).collect(),
        }
    }

    #[test]
    fn three_members_fan_at_equal_angles() {
        let store = store_with(vec![
            farm(1, 45.500, -122.600),
            farm(2, 45.501, -122.601),
            farm(3, 45.502, -122.602),
        ]);
        let zoom = 12.0;
        let c = cluster_of(&store, &[1, 2, 3]);

        let params = SpiderfyParams::default();
        let spider = fan_out(&c, &store, zoom, &params);
        assert_eq!(spider.legs.len(), 3);

        let centroid_px = project(c.centroid, zoom);
        let mut angles: Vec<f64> = spider
            .legs
            .iter()
            .map(|leg| {
                let px = project(leg.position, zoom);
                assert!((px.distance(centroid_px) - params.radius_px).abs() < 1.0);
                (px.y - centroid_px.y).atan2(px.x - centroid_px.x)
            })
            .collect();
        angles.sort_by(|a, b| a.partial_cmp(b).unwrap());

        // 120 degrees between consecutive legs.
        let spacing = 2.0 * std::f64::consts::PI / 3.0;
        assert!((angles[1] - angles[0] - spacing).abs() < 1e-6);
        assert!((angles[2] - angles[1] - spacing).abs() < 1e-6);
    }

    #[test]
    fn caps_at_max_legs_keeping_nearest() {
        let mut farms: Vec<Listing> = (1..=9)
            .map(|i| farm(i, 45.5 + i as f64 * 1e-5, -122.6))
            .collect();
        // Member 10 sits far from the rest, so it is the one left under
        // the collapsed cluster.
        farms.push(farm(10, 45.6, -122.6));
        let store = store_with(farms);
        let c = cluster_of(&store, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        let spider = fan_out(&c, &store, 8.0, &SpiderfyParams::default());
        assert_eq!(spider.legs.len(), 8);
        assert!(!spider.legs.iter().any(|l| l.listing == ListingId(10)));
    }

    #[test]
    fn appearance_delays_are_staggered() {
        let store = store_with(vec![
            farm(1, 45.500, -122.600),
            farm(2, 45.501, -122.601),
            farm(3, 45.502, -122.602),
        ]);
        let c = cluster_of(&store, &[1, 2, 3]);
        let spider = fan_out(&c, &store, 12.0, &SpiderfyParams::default());
        let delays: Vec<u64> = spider.legs.iter().map(|l| l.appear_delay_ms).collect();
        assert_eq!(delays, vec![0, 50, 100]);
    }
}
