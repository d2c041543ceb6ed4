//! Legacy fallback persistence surface.
//!
//! On very old hosts with neither native notifications nor durable
//! storage, an auxiliary off-document context (historically a hidden
//! secondary browsing context) is used purely to retain one blob across a
//! hard page transition. It is a durability detail, never a signaling
//! path, and must not change the normalized event contract.

use std::sync::Mutex;

use crate::error::Result;

/// A single-slot blob store tied to one synthetic identifier per running
/// instance.
pub trait FrameStore: Send + Sync {
    /// Overwrite the retained blob.
    fn write(&self, blob: &[u8]) -> Result<()>;

    /// Read the retained blob, if any.
    fn read(&self) -> Result<Option<Vec<u8>>>;

    /// The synthetic identifier binding this surface to one instance.
    fn instance_id(&self) -> u64;
}

/// In-memory frame store for tests and embeddings without a real
/// auxiliary context.
pub struct MemoryFrameStore {
    id: u64,
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemoryFrameStore {
    /// Create a store with a fresh synthetic identifier.
    pub fn new() -> Self {
        use rand::Rng;
        Self {
            id: rand::thread_rng().gen(),
            slot: Mutex::new(None),
        }
    }
}

impl Default for MemoryFrameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStore for MemoryFrameStore {
    fn write(&self, blob: &[u8]) -> Result<()> {
        *self.slot.lock().unwrap() = Some(blob.to_vec());
        Ok(())
    }

    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn instance_id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_store_roundtrip() {
        let frame = MemoryFrameStore::new();
        assert!(frame.read().unwrap().is_none());

        frame.write(b"snapshot-1").unwrap();
        assert_eq!(frame.read().unwrap().unwrap(), b"snapshot-1");

        frame.write(b"snapshot-2").unwrap();
        assert_eq!(frame.read().unwrap().unwrap(), b"snapshot-2");
    }

    #[test]
    fn test_frame_store_distinct_instances() {
        assert_ne!(
            MemoryFrameStore::new().instance_id(),
            MemoryFrameStore::new().instance_id()
        );
    }
}
