use std::collections::BTreeMap;

use geo::{LatLng, project};
use listings::{Listing, ListingId};
use serde::{Deserialize, Serialize};

/// Cluster identity: the smallest member listing id.
///
/// Stable across pans while membership is stable, so the reconciler keeps
/// the marker instead of recreating it every frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterId(pub u64);

/// Derived, ephemeral grouping of visible listings. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: ClusterId,
    /// Mean member position.
    pub centroid: LatLng,
    /// Member ids, ascending.
    pub members: Vec<ListingId>,
}

impl Cluster {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Tie-break rules for clicking a cluster marker, by member count:
    /// small clusters fan out in place, mid-size clusters zoom one level,
    /// large clusters zoom two.
    pub fn click_action(&self, current_zoom: f64) -> ClusterClickAction {
        let n = self.count();
        if n <= 5 {
            ClusterClickAction::Spiderfy
        } else if n <= 10 {
            ClusterClickAction::ZoomIn {
                zoom: (current_zoom + 1.0).min(18.0),
                center: self.centroid,
            }
        } else {
            ClusterClickAction::ZoomIn {
                zoom: (current_zoom + 2.0).min(19.0),
                center: self.centroid,
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ClusterClickAction {
    /// Fan members into a circle; no viewport change.
    Spiderfy,
    /// Re-center on the centroid at the given (capped) zoom.
    ZoomIn { zoom: f64, center: LatLng },
}

/// Grid clustering tunables.
///
/// The radius curve is deliberately a parameter, not a constant: the right
/// taper is empirical, and the marker-count and click-policy properties
/// must hold for any monotonically decreasing curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterParams {
    /// Clustering radius in screen pixels at zoom 0.
    #[serde(default = "default_base_radius_px")]
    pub base_radius_px: f64,
    /// Zoom at (and past) which every listing stands alone.
    #[serde(default = "default_unclustered_zoom")]
    pub unclustered_zoom: f64,
    /// Grid cells with fewer members than this stay unclustered.
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
}

fn default_base_radius_px() -> f64 {
    60.0
}

fn default_unclustered_zoom() -> f64 {
    17.0
}

fn default_min_cluster_size() -> usize {
    2
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            base_radius_px: default_base_radius_px(),
            unclustered_zoom: default_unclustered_zoom(),
            min_cluster_size: default_min_cluster_size(),
        }
    }
}

impl ClusterParams {
    /// Clustering radius in screen pixels at `zoom`: linear taper from
    /// `base_radius_px` down to zero at `unclustered_zoom`.
    pub fn radius_px(&self, zoom: f64) -> f64 {
        if zoom >= self.unclustered_zoom {
            return 0.0;
        }
        self.base_radius_px * (1.0 - zoom / self.unclustered_zoom)
    }
}

/// Partition of the visible set into clusters and stand-alone listings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Clustered {
    /// Ascending by id.
    pub clusters: Vec<Cluster>,
    /// Unclustered visible listings, ascending by id.
    pub single: Vec<ListingId>,
}

impl Clustered {
    /// Number of markers this partition puts on the map.
    pub fn marker_count(&self) -> usize {
        self.clusters.len() + self.single.len()
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.id == id)
    }
}

/// Groups visible listings into grid cells of one clustering radius at the
/// current zoom.
///
/// Ordering contract:
/// - `clusters` ascending by `ClusterId`, members ascending by id.
/// - `single` ascending by id.
pub fn cluster_listings<'a>(
    listings: impl IntoIterator<Item = &'a Listing>,
    zoom: f64,
    params: &ClusterParams,
) -> Clustered {
    let radius = params.radius_px(zoom);

    if radius <= 0.0 {
        let mut single: Vec<ListingId> = listings.into_iter().map(|l| l.id).collect();
        single.sort();
        return Clustered {
            clusters: Vec::new(),
            single,
        };
    }

    let mut cells: BTreeMap<(i64, i64), Vec<(ListingId, LatLng)>> = BTreeMap::new();
    for listing in listings {
        let px = project(listing.position(), zoom);
        let cell = ((px.x / radius).floor() as i64, (px.y / radius).floor() as i64);
        cells
            .entry(cell)
            .or_default()
            .push((listing.id, listing.position()));
    }

    let mut clusters = Vec::new();
    let mut single = Vec::new();

    for (_cell, mut members) in cells {
        if members.len() < params.min_cluster_size {
            single.extend(members.iter().map(|(id, _)| *id));
            continue;
        }

        members.sort_by_key(|(id, _)| *id);
        let n = members.len() as f64;
        let centroid = LatLng::new(
            members.iter().map(|(_, p)| p.lat).sum::<f64>() / n,
            members.iter().map(|(_, p)| p.lng).sum::<f64>() / n,
        );
        clusters.push(Cluster {
            id: ClusterId(members[0].0.0),
            centroid,
            members: members.into_iter().map(|(id, _)| id).collect(),
        });
    }

    clusters.sort_by_key(|c| c.id);
    single.sort();

    Clustered { clusters, single }
}
