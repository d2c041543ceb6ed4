//! Proptest generators for property-based testing.

use proptest::prelude::*;

use wayline_core::{Address, NavigationEntry, SeqPos, StateId, StatePayload};

/// Generate a random StateId.
pub fn state_id() -> impl Strategy<Value = StateId> {
    any::<[u8; 16]>().prop_map(StateId::from_bytes)
}

/// Generate a URL path without a fragment.
pub fn path() -> impl Strategy<Value = String> {
    "(/[a-z][a-z0-9-]{0,11}){1,3}".prop_map(String::from)
}

/// Generate a fragment identifier.
pub fn fragment() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Generate an address, with or without a fragment.
pub fn address() -> impl Strategy<Value = Address> {
    (path(), prop::option::of(fragment())).prop_map(|(p, frag)| match frag {
        Some(f) => Address::new(format!("{}#{}", p, f)),
        None => Address::new(p),
    })
}

/// Generate a sequence of pairwise-distinct consecutive fragments, as an
/// external actor rewriting the fragment repeatedly would produce.
pub fn distinct_fragments(len: impl Into<prop::collection::SizeRange>) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(fragment(), len).prop_map(|frags| {
        let mut out: Vec<String> = Vec::with_capacity(frags.len());
        for (i, frag) in frags.into_iter().enumerate() {
            // Suffix with the index so consecutive values never collide.
            out.push(format!("{}-{}", frag, i));
        }
        out
    })
}

/// Generate a small JSON value usable as navigation state.
pub fn json_state() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(serde_json::Value::from),
        any::<bool>().prop_map(serde_json::Value::from),
        "[a-z ]{0,24}".prop_map(serde_json::Value::from),
    ];
    prop::collection::btree_map("[a-z]{1,8}", leaf, 0..5)
        .prop_map(|m| serde_json::Value::Object(m.into_iter().collect()))
}

/// Generate an encoded payload.
pub fn payload() -> impl Strategy<Value = StatePayload> {
    json_state().prop_map(|v| StatePayload::encode(&v).expect("json encodes"))
}

/// Generate a navigation entry with the given sequence position.
pub fn entry_at(seq: u64) -> impl Strategy<Value = NavigationEntry> {
    (address(), state_id(), prop::option::of("[A-Za-z ]{1,16}"))
        .prop_map(move |(addr, id, title)| NavigationEntry::new(addr, id, title, SeqPos(seq)))
}

/// Generate an entry stack with strictly increasing positions.
pub fn entry_stack(max_len: usize) -> impl Strategy<Value = Vec<NavigationEntry>> {
    prop::collection::vec((address(), state_id()), 1..=max_len).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (addr, id))| NavigationEntry::new(addr, id, None, SeqPos(i as u64 + 1)))
            .collect()
    })
}
