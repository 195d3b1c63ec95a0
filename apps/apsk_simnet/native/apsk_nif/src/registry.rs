//! Handle registry for constellations shared with the BEAM
//!
//! Constellations are immutable once built, so entries are handed out as
//! `Arc`s and experiments run without holding any registry lock. IDs are
//! never reused, even after a slot is freed.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

struct RegistryState<T> {
    entries: HashMap<u64, Arc<T>>,
    next_id: u64,
}

/// Bounded ID → `Arc<T>` map
pub struct Registry<T> {
    capacity: usize,
    state: RwLock<RegistryState<T>>,
}

impl<T> Registry<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: RwLock::new(RegistryState {
                entries: HashMap::with_capacity(capacity),
                next_id: 0,
            }),
        }
    }

    /// Insert an item, returns its ID or None if full
    pub fn insert(&self, item: T) -> Option<u64> {
        let mut state = self.state.write().ok()?;
        if state.entries.len() >= self.capacity {
            return None;
        }
        let id = state.next_id;
        state.next_id += 1;
        state.entries.insert(id, Arc::new(item));
        Some(id)
    }

    /// Shared handle to an entry; the registry lock is released on return
    pub fn get(&self, id: u64) -> Option<Arc<T>> {
        let state = self.state.read().ok()?;
        state.entries.get(&id).cloned()
    }

    /// Remove an entry; outstanding `Arc`s stay valid
    pub fn remove(&self, id: u64) -> Option<Arc<T>> {
        let mut state = self.state.write().ok()?;
        state.entries.remove(&id)
    }

    /// Get the number of live entries
    pub fn count(&self) -> usize {
        self.state.read().map(|s| s.entries.len()).unwrap_or(0)
    }
}
