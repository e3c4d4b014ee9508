use std::collections::BTreeMap;

use geo::LatLng;

use crate::sdk::{MapSdk, MarkerKey, MarkerSpec};

/// In-memory SDK double: tracks live markers and records every call so
/// tests can assert on lifecycle behavior.
#[derive(Debug, Default)]
pub(crate) struct RecordingSdk {
    pub ready: bool,
    pub live: BTreeMap<MarkerKey, MarkerSpec>,
    pub emphasized: BTreeMap<MarkerKey, bool>,
    pub open_popups: Vec<MarkerKey>,
    pub adds: usize,
    pub updates: usize,
    pub removes: usize,
    pub jumps: Vec<(LatLng, f64)>,
}

impl RecordingSdk {
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }
}

impl MapSdk for RecordingSdk {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn add_marker(&mut self, spec: &MarkerSpec) {
        self.adds += 1;
        self.live.insert(spec.key, *spec);
    }

    fn update_marker(&mut self, spec: &MarkerSpec) {
        self.updates += 1;
        self.live.insert(spec.key, *spec);
    }

    fn remove_marker(&mut self, key: MarkerKey) {
        if self.live.remove(&key).is_some() {
            self.removes += 1;
        }
        self.emphasized.remove(&key);
        self.open_popups.retain(|k| *k != key);
    }

    fn set_emphasis(&mut self, key: MarkerKey, emphasized: bool) {
        self.emphasized.insert(key, emphasized);
    }

    fn open_popup(&mut self, key: MarkerKey) {
        if !self.open_popups.contains(&key) {
            self.open_popups.push(key);
        }
    }

    fn close_popup(&mut self, key: MarkerKey) {
        self.open_popups.retain(|k| *k != key);
    }

    fn jump_to(&mut self, center: LatLng, zoom: f64) {
        self.jumps.push((center, zoom));
    }
}
