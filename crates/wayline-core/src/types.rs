//! Strong type definitions for the Wayline layer.
//!
//! Identifiers and positions are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entry::Address;

/// A 16-byte opaque state identifier.
///
/// Links a [`NavigationEntry`](crate::NavigationEntry) to the payload held
/// by the state store. Fresh ids come from [`StateId::random`] on push;
/// addresses observed without host-supplied state get a deterministic
/// synthetic id via [`StateId::derive`], so the same externally typed
/// fragment always resolves to the same id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateId(pub [u8; 16]);

impl StateId {
    /// Create a new StateId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Generate a fresh random id for a newly pushed entry.
    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derive a synthetic id from an address.
    ///
    /// Used when a raw signal carries no host-supplied state, e.g. a plain
    /// fragment navigation typed by the user. Deterministic: the same
    /// address always derives the same id.
    pub fn derive(address: &Address) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"wayline-state-v0:");
        hasher.update(address.as_str().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash.as_bytes()[..16]);
        Self(bytes)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 16 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The zero state ID (used as a sentinel).
    pub const ZERO: Self = Self([0u8; 16]);
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateId({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

impl AsRef<[u8]> for StateId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 16]> for StateId {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

/// A monotonically increasing sequence position.
///
/// Every entry the layer produces or observes is stamped with one. Locally
/// generated positions never decrease; externally originated signals (the
/// user clicking back) may legitimately reference an earlier position.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SeqPos(pub u64);

impl SeqPos {
    /// The position before any entry has been recorded.
    pub const ZERO: Self = Self(0);

    /// The next position after this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SeqPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqPos({})", self.0)
    }
}

impl fmt::Display for SeqPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
