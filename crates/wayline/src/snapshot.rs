//! Legacy-mode checkpoints.
//!
//! With neither native notifications nor durable storage, the only way
//! state survives a hard document transition is the auxiliary frame
//! surface. The navigator checkpoints its tracked stack and the payload
//! bytes there after every committed mutation, and restores the snapshot
//! at startup.

use serde::{Deserialize, Serialize};

use wayline_core::{CoreError, NavigationEntry, StateId};

/// Everything needed to rebuild the layer after a hard transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacySnapshot {
    /// The tracked entry stack, oldest first.
    pub entries: Vec<NavigationEntry>,
    /// Index of the entry that was current at checkpoint time.
    pub index: usize,
    /// Raw payload bytes per live state id.
    pub payloads: Vec<(StateId, Vec<u8>)>,
}

impl LegacySnapshot {
    /// Encode to the blob the frame surface retains.
    pub fn encode(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode a retained blob.
    pub fn decode(blob: &[u8]) -> Result<Self, CoreError> {
        ciborium::from_reader(blob).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}
