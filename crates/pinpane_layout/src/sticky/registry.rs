//! Registered regions
//!
//! Set semantics keyed by `Arc` identity. Iteration follows registration
//! order, which keeps the stable sibling sort deterministic.

use std::sync::Arc;

use indexmap::IndexMap;

use super::SharedRegion;

/// Identity of a shared region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKey(usize);

impl RegionKey {
    pub fn of(region: &SharedRegion) -> Self {
        RegionKey(Arc::as_ptr(region) as *const () as usize)
    }
}

#[derive(Default)]
pub struct Registry {
    regions: IndexMap<RegionKey, SharedRegion>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the region was already registered
    pub fn insert(&mut self, region: SharedRegion) -> bool {
        let key = RegionKey::of(&region);
        if self.regions.contains_key(&key) {
            return false;
        }
        self.regions.insert(key, region);
        true
    }

    /// Returns the removed handle, if it was registered
    pub fn remove(&mut self, region: &SharedRegion) -> Option<SharedRegion> {
        self.regions.shift_remove(&RegionKey::of(region))
    }

    pub fn contains(&self, region: &SharedRegion) -> bool {
        self.regions.contains_key(&RegionKey::of(region))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Copy of the current membership, safe to iterate while the registry
    /// changes underneath
    pub fn snapshot(&self) -> Vec<SharedRegion> {
        self.regions.values().map(Arc::clone).collect()
    }
}
