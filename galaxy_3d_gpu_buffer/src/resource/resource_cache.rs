/// Resource cache: registration, budget accounting and scratch lookup
///
/// The cache tracks resources by `ResourceId` but owns none of them, and
/// never touches native handles. Resources notify it when they are released,
/// abandoned or dropped.
///
/// A resource with a scratch key becomes findable only after it has been
/// handed back with `make_available()`; `find_scratch()` takes it out again.

use slotmap::{new_key_type, SlotMap};
use rustc_hash::FxHashMap;
use crate::engine_trace;
use crate::gpu::scratch_key::ScratchKey;

new_key_type! {
    /// Id of a registered resource
    pub struct ResourceId;
}

/// Whether a resource counts against the cache budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budgeted {
    Yes,
    No,
}

#[derive(Debug)]
struct CacheEntry {
    size: usize,
    budgeted: Budgeted,
    scratch_key: Option<ScratchKey>,
    available: bool,
}

pub struct ResourceCache {
    entries: SlotMap<ResourceId, CacheEntry>,
    scratch_map: FxHashMap<ScratchKey, Vec<ResourceId>>,
    budgeted_bytes: usize,
    budgeted_count: usize,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            scratch_map: FxHashMap::default(),
            budgeted_bytes: 0,
            budgeted_count: 0,
        }
    }

    /// Register a live, in-use resource
    pub fn insert(&mut self, size: usize, budgeted: Budgeted, scratch_key: Option<ScratchKey>) -> ResourceId {
        if budgeted == Budgeted::Yes {
            self.budgeted_bytes += size;
            self.budgeted_count += 1;
        }
        self.entries.insert(CacheEntry { size, budgeted, scratch_key, available: false })
    }

    /// Forget a resource (released, abandoned or dropped)
    pub fn remove(&mut self, id: ResourceId) {
        let Some(entry) = self.entries.remove(id) else {
            return;
        };
        if entry.budgeted == Budgeted::Yes {
            self.budgeted_bytes -= entry.size;
            self.budgeted_count -= 1;
        }
        if let Some(key) = entry.scratch_key {
            self.unlink_scratch(&key, id);
        }
        engine_trace!("galaxy3d::ResourceCache", "Removed resource {:?}", id);
    }

    /// Drop the scratch key; the resource can no longer be found by shape
    pub fn remove_scratch_key(&mut self, id: ResourceId) {
        let key = match self.entries.get_mut(id) {
            Some(entry) => entry.scratch_key.take(),
            None => return,
        };
        if let Some(key) = key {
            self.unlink_scratch(&key, id);
        }
    }

    /// Hand a resource back for reuse. Returns `false` if it has no scratch key.
    pub fn make_available(&mut self, id: ResourceId) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        let Some(key) = entry.scratch_key else {
            return false;
        };
        if !entry.available {
            entry.available = true;
            self.scratch_map.entry(key).or_default().push(id);
        }
        true
    }

    /// Take an available resource matching `key`, most recently returned first
    pub fn find_scratch(&mut self, key: &ScratchKey) -> Option<ResourceId> {
        let ids = self.scratch_map.get_mut(key)?;
        let id = ids.pop()?;
        if ids.is_empty() {
            self.scratch_map.remove(key);
        }
        if let Some(entry) = self.entries.get_mut(id) {
            entry.available = false;
        }
        Some(id)
    }

    fn unlink_scratch(&mut self, key: &ScratchKey, id: ResourceId) {
        if let Some(ids) = self.scratch_map.get_mut(key) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.scratch_map.remove(key);
            }
        }
    }

    // ===== QUERIES =====

    pub fn contains(&self, id: ResourceId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn scratch_key(&self, id: ResourceId) -> Option<&ScratchKey> {
        self.entries.get(id)?.scratch_key.as_ref()
    }

    pub fn is_available(&self, id: ResourceId) -> bool {
        self.entries.get(id).is_some_and(|entry| entry.available)
    }

    /// Resources currently waiting for reuse under `key`
    pub fn available_count(&self, key: &ScratchKey) -> usize {
        self.scratch_map.get(key).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn budgeted_bytes(&self) -> usize {
        self.budgeted_bytes
    }

    pub fn budgeted_count(&self) -> usize {
        self.budgeted_count
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "resource_cache_tests.rs"]
mod tests;
