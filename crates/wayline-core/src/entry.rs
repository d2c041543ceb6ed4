//! Addresses and navigation entries.
//!
//! An entry is one addressable position. Entries are immutable once
//! created: replace supersedes the current entry with a new one sharing
//! the same state id, it never mutates in place.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{SeqPos, StateId};

/// A URL string as the host's address bar carries it.
///
/// Equality is exact string equality; the layer does no normalization
/// beyond what the host itself reports.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Wrap a URL string.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The full address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The fragment (text after `#`), if any.
    ///
    /// `"/page#top"` yields `Some("top")`; a trailing bare `#` yields
    /// `Some("")`; no `#` at all yields `None`.
    pub fn fragment(&self) -> Option<&str> {
        self.0.split_once('#').map(|(_, frag)| frag)
    }

    /// This address with its fragment replaced (or appended).
    pub fn with_fragment(&self, fragment: &str) -> Self {
        let base = self.0.split_once('#').map_or(self.0.as_str(), |(b, _)| b);
        Self(format!("{}#{}", base, fragment))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One addressable position: an address plus an opaque state reference.
///
/// The entry holds only a [`StateId`], never the payload itself; the
/// underlying address representation may not be able to carry arbitrary
/// data, so payloads live in the state store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEntry {
    /// The address this entry occupies.
    pub address: Address,
    /// Reference to the payload held by the state store.
    pub state_id: StateId,
    /// Optional document title.
    pub title: Option<String>,
    /// The sequence position stamped when this entry became known.
    pub seq: SeqPos,
}

impl NavigationEntry {
    /// Create an entry.
    pub fn new(address: Address, state_id: StateId, title: Option<String>, seq: SeqPos) -> Self {
        Self {
            address,
            state_id,
            title,
            seq,
        }
    }

    /// Whether `other` refers to the same position: same address and the
    /// same state reference. Title and sequence stamp are not identity.
    pub fn same_position(&self, other: &NavigationEntry) -> bool {
        self.address == other.address && self.state_id == other.state_id
    }
}

impl fmt::Debug for NavigationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationEntry")
            .field("address", &self.address)
            .field("state_id", &self.state_id)
            .field("seq", &self.seq)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_extraction() {
        assert_eq!(Address::new("/page#top").fragment(), Some("top"));
        assert_eq!(Address::new("/page#").fragment(), Some(""));
        assert_eq!(Address::new("/page").fragment(), None);
    }

    #[test]
    fn test_with_fragment_replaces() {
        let addr = Address::new("/page#old");
        assert_eq!(addr.with_fragment("new").as_str(), "/page#new");
    }

    #[test]
    fn test_with_fragment_appends() {
        let addr = Address::new("/page");
        assert_eq!(addr.with_fragment("x").as_str(), "/page#x");
    }

    #[test]
    fn test_same_position_ignores_title_and_seq() {
        let id = StateId::from_bytes([1; 16]);
        let a = NavigationEntry::new(Address::new("/a"), id, Some("A".into()), SeqPos(1));
        let b = NavigationEntry::new(Address::new("/a"), id, None, SeqPos(9));
        assert!(a.same_position(&b));
    }

    proptest::proptest! {
        #[test]
        fn prop_with_fragment_then_fragment(base in "/[a-z]{0,12}", frag in "[a-z0-9-]{0,16}") {
            let addr = Address::new(base).with_fragment(&frag);
            proptest::prop_assert_eq!(addr.fragment(), Some(frag.as_str()));
        }
    }

    #[test]
    fn test_same_position_distinguishes_state() {
        let a = NavigationEntry::new(
            Address::new("/a"),
            StateId::from_bytes([1; 16]),
            None,
            SeqPos(1),
        );
        let b = NavigationEntry::new(
            Address::new("/a"),
            StateId::from_bytes([2; 16]),
            None,
            SeqPos(1),
        );
        assert!(!a.same_position(&b));
    }
}
