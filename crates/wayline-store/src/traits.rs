//! StateStore trait: the abstract interface for payload persistence.
//!
//! This trait allows the navigation layer to be storage-agnostic.
//! Implementations include SQLite (durable) and in-memory (volatile
//! fallback, also used in tests).

use wayline_core::{StateId, StatePayload};

use crate::error::Result;

/// The StateStore trait: synchronous key/value persistence for payloads.
///
/// Exactly one payload exists per live state id. Replacing an entry
/// overwrites its payload in place under the same id; pushing writes a
/// fresh id. All operations are synchronous and total: absent lookups
/// return `Ok(None)`, and removing a missing key succeeds.
pub trait StateStore: Send + Sync {
    /// Associate a payload with a state id, overwriting any previous value.
    fn put(&self, id: &StateId, payload: &StatePayload) -> Result<()>;

    /// Look up the payload for a state id.
    fn get(&self, id: &StateId) -> Result<Option<StatePayload>>;

    /// Remove a payload. Removing an absent id is not an error.
    fn remove(&self, id: &StateId) -> Result<()>;

    /// Whether payloads survive a full document reload.
    ///
    /// `false` means the volatile fallback is active and loss-on-reload is
    /// the documented degradation.
    fn is_durable(&self) -> bool;

    /// Number of live payloads.
    fn len(&self) -> Result<usize>;

    /// Whether the store holds no payloads.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every payload whose id is not in `keep`.
    ///
    /// Called after a push truncates forward entries out of the tracked
    /// stack, so orphaned payloads do not accumulate for the lifetime of
    /// the document.
    fn prune_except(&self, keep: &[StateId]) -> Result<usize>;
}

impl<S: StateStore + ?Sized> StateStore for std::sync::Arc<S> {
    fn put(&self, id: &StateId, payload: &StatePayload) -> Result<()> {
        (**self).put(id, payload)
    }

    fn get(&self, id: &StateId) -> Result<Option<StatePayload>> {
        (**self).get(id)
    }

    fn remove(&self, id: &StateId) -> Result<()> {
        (**self).remove(id)
    }

    fn is_durable(&self) -> bool {
        (**self).is_durable()
    }

    fn len(&self) -> Result<usize> {
        (**self).len()
    }

    fn prune_except(&self, keep: &[StateId]) -> Result<usize> {
        (**self).prune_except(keep)
    }
}
