use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// The fixed set of filterable listing attributes.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Products,
    Practices,
    Availability,
    Delivery,
}

impl FilterKey {
    pub const ALL: [FilterKey; 4] = [
        FilterKey::Products,
        FilterKey::Practices,
        FilterKey::Availability,
        FilterKey::Delivery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Products => "products",
            FilterKey::Practices => "practices",
            FilterKey::Availability => "availability",
            FilterKey::Delivery => "delivery",
        }
    }

    pub fn parse(s: &str) -> Option<FilterKey> {
        FilterKey::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

/// Selected option values per filter key.
///
/// An absent or empty set for a key means "no restriction on that key".
/// Insertion order within a key is irrelevant; storage is sorted so the
/// serialized form is stable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSet {
    values: BTreeMap<FilterKey, BTreeSet<String>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.is_empty())
    }

    pub fn selected(&self, key: FilterKey) -> impl Iterator<Item = &str> {
        self.values
            .get(&key)
            .into_iter()
            .flat_map(|v| v.iter().map(|s| s.as_str()))
    }

    /// Returns `true` if the set changed.
    pub fn select(&mut self, key: FilterKey, value: impl Into<String>) -> bool {
        self.values.entry(key).or_default().insert(value.into())
    }

    /// Returns `true` if the set changed.
    pub fn deselect(&mut self, key: FilterKey, value: &str) -> bool {
        match self.values.get_mut(&key) {
            Some(set) => set.remove(value),
            None => false,
        }
    }

    /// Replaces the selection for one key wholesale.
    pub fn set_values<I, S>(&mut self, key: FilterKey, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if set.is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, set);
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Comma-joined selection for a key, `None` when unrestricted.
    ///
    /// This is the round-trip form used in URL query params.
    pub fn comma_joined(&self, key: FilterKey) -> Option<String> {
        let set = self.values.get(&key)?;
        if set.is_empty() {
            return None;
        }
        Some(set.iter().cloned().collect::<Vec<_>>().join(","))
    }

    /// Inverse of [`FilterSet::comma_joined`]; blank segments are skipped.
    pub fn set_comma_joined(&mut self, key: FilterKey, joined: &str) {
        self.set_values(
            key,
            joined
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        );
    }
}
