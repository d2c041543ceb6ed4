//! # Wayline Core
//!
//! Pure primitives for the Wayline navigation layer: addresses, navigation
//! entries, state identifiers, and raw signals.
//!
//! This crate contains no I/O, no storage, no timers. It is pure data
//! shared by the store, host, and facade crates.
//!
//! ## Key Types
//!
//! - [`Address`] - A URL string as the host's address bar carries it
//! - [`StateId`] - Opaque 16-byte identifier linking an entry to its payload
//! - [`NavigationEntry`] - One addressable position (address + state reference)
//! - [`StatePayload`] - CBOR-encoded opaque state, owned by the store
//! - [`RawSignal`] - The normalized shape of a host-level change notification
//!
//! ## Payloads stay out of entries
//!
//! A [`NavigationEntry`] never holds its payload, only a [`StateId`]. The
//! address representation of some hosts cannot carry arbitrary data, so the
//! payload lives in the state store and is recovered by id.

pub mod entry;
pub mod error;
pub mod payload;
pub mod signal;
pub mod types;

pub use entry::{Address, NavigationEntry};
pub use error::CoreError;
pub use payload::StatePayload;
pub use signal::RawSignal;
pub use types::{SeqPos, StateId};
