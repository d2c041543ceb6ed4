//! # Wayline Host
//!
//! The host boundary: capability probing, the consumed host surface, and
//! signal adaptation.
//!
//! ## Overview
//!
//! A host environment may support native URL-state manipulation (set an
//! address with attached state, get notified on position changes), or only
//! expose the address bar itself, leaving change detection to us. This
//! crate hides that difference behind one normalized raw-signal stream:
//!
//! - [`HostBackend`] - the trait a host embedding implements
//! - [`Capabilities`] / [`BackendMode`] - probed once at startup, never
//!   re-evaluated per call
//! - [`SignalAdapter`] - merges native notifications and fragment polling
//!   into one `RawSignal` stream
//! - [`FrameStore`] - the legacy auxiliary persistence surface
//! - [`MemoryHost`] - channel-backed host double for tests
//!
//! ## Detection latency
//!
//! Under emulation the adapter polls at a bounded interval; the contract is
//! bounded-latency detection, not zero-latency. The interval is a tunable
//! in [`AdapterConfig`], and [`SignalAdapter::nudge`] wakes the poller
//! early when the embedding has a visibility or focus hint.

pub mod adapter;
pub mod backend;
pub mod capabilities;
pub mod error;
pub mod legacy;
pub mod memory;

pub use adapter::{AdapterConfig, SignalAdapter};
pub use backend::{CommitMode, HostBackend};
pub use capabilities::{BackendMode, Capabilities};
pub use error::{HostError, Result};
pub use legacy::{FrameStore, MemoryFrameStore};
pub use memory::MemoryHost;
