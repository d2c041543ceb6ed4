//! In-memory implementation of the StateStore trait.
//!
//! The volatile fallback when the host offers no durable storage surface.
//! Same semantics as SQLite but everything lives in process memory; all
//! payloads are lost across a full document reload, which is the
//! documented degradation of this mode.

use std::collections::HashMap;
use std::sync::RwLock;

use wayline_core::{StateId, StatePayload};

use crate::error::Result;
use crate::traits::StateStore;

/// In-memory store implementation.
///
/// Thread-safe via RwLock. All data is lost when the store is dropped.
pub struct MemoryStore {
    payloads: RwLock<HashMap<StateId, StatePayload>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            payloads: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn put(&self, id: &StateId, payload: &StatePayload) -> Result<()> {
        let mut payloads = self.payloads.write().unwrap();
        payloads.insert(*id, payload.clone());
        Ok(())
    }

    fn get(&self, id: &StateId) -> Result<Option<StatePayload>> {
        let payloads = self.payloads.read().unwrap();
        Ok(payloads.get(id).cloned())
    }

    fn remove(&self, id: &StateId) -> Result<()> {
        let mut payloads = self.payloads.write().unwrap();
        payloads.remove(id);
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn len(&self) -> Result<usize> {
        Ok(self.payloads.read().unwrap().len())
    }

    fn prune_except(&self, keep: &[StateId]) -> Result<usize> {
        let mut payloads = self.payloads.write().unwrap();
        let before = payloads.len();
        payloads.retain(|id, _| keep.contains(id));
        let pruned = before - payloads.len();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned orphaned payloads");
        }
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(n: u32) -> StatePayload {
        StatePayload::encode(&n).unwrap()
    }

    #[test]
    fn test_memory_store_put_get() {
        let store = MemoryStore::new();
        let id = StateId::from_bytes([1; 16]);

        store.put(&id, &payload(7)).unwrap();
        let got = store.get(&id).unwrap().unwrap();
        assert_eq!(got.decode::<u32>().unwrap(), 7);
    }

    #[test]
    fn test_memory_store_absent_is_none() {
        let store = MemoryStore::new();
        assert!(store.get(&StateId::from_bytes([9; 16])).unwrap().is_none());
    }

    #[test]
    fn test_memory_store_put_overwrites() {
        let store = MemoryStore::new();
        let id = StateId::from_bytes([1; 16]);

        store.put(&id, &payload(1)).unwrap();
        store.put(&id, &payload(2)).unwrap();

        let got = store.get(&id).unwrap().unwrap();
        assert_eq!(got.decode::<u32>().unwrap(), 2);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_memory_store_remove_idempotent() {
        let store = MemoryStore::new();
        let id = StateId::from_bytes([1; 16]);

        store.put(&id, &payload(1)).unwrap();
        store.remove(&id).unwrap();
        store.remove(&id).unwrap();
        assert!(store.get(&id).unwrap().is_none());
    }

    #[test]
    fn test_memory_store_prune_except() {
        let store = MemoryStore::new();
        let keep = StateId::from_bytes([1; 16]);
        let drop_a = StateId::from_bytes([2; 16]);
        let drop_b = StateId::from_bytes([3; 16]);

        store.put(&keep, &payload(1)).unwrap();
        store.put(&drop_a, &payload(2)).unwrap();
        store.put(&drop_b, &payload(3)).unwrap();

        let pruned = store.prune_except(&[keep]).unwrap();
        assert_eq!(pruned, 2);
        assert!(store.get(&keep).unwrap().is_some());
        assert!(store.get(&drop_a).unwrap().is_none());
    }

    #[test]
    fn test_memory_store_not_durable() {
        assert!(!MemoryStore::new().is_durable());
    }
}
