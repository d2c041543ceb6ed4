//! Opaque state payloads.
//!
//! A payload is whatever serializable value the caller associated with an
//! entry, held as CBOR bytes. The store owns payloads exclusively; entries
//! carry only the state id.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use crate::error::CoreError;

/// CBOR-encoded opaque state associated with one state id.
#[derive(Clone, PartialEq, Eq)]
pub struct StatePayload(Bytes);

impl StatePayload {
    /// Encode a serializable value.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(Self(Bytes::from(buf)))
    }

    /// Decode back into a concrete type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CoreError> {
        ciborium::from_reader(&self.0[..]).map_err(|e| CoreError::DecodingError(e.to_string()))
    }

    /// Wrap raw CBOR bytes, e.g. read back from storage.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// The raw CBOR bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for StatePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatePayload({} bytes)", self.0.len())
    }
}
