//! # Wayline
//!
//! A navigation-history state layer: pushes and replaces addressable
//! entries with attached state, tracks the current position, and merges
//! local mutations with host-driven navigation into one de-duplicated,
//! ordered event stream.
//!
//! ## Overview
//!
//! The host environment may offer native URL-state primitives, or only a
//! watchable address fragment, or not even durable storage. Wayline probes
//! once at startup and runs the same caller-facing surface over whichever
//! backend mode came out of the probe:
//!
//! - **Native**: the host manipulates state-carrying entries itself and
//!   notifies on position changes.
//! - **Emulated**: the layer owns the entry stack, writes fragments, and
//!   polls for external changes at a bounded interval.
//! - **Legacy**: emulation plus an auxiliary frame surface that
//!   checkpoints the stack across reloads.
//!
//! ## Key types
//!
//! - [`Navigator`] - the facade: push/replace/traverse, reads, subscribers
//! - [`Sequencer`] - the pure synchronization core (echo suppression,
//!   duplicate collapse, position stamping)
//! - [`NavigationEntry`] / [`StatePayload`] - an entry and its opaque,
//!   store-owned state
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wayline::{MemoryHost, MemoryStore, Navigator, NavigatorConfig};
//!
//! # #[tokio::main] async fn main() -> wayline::Result<()> {
//! let host = Arc::new(MemoryHost::native("/inbox"));
//! let nav = Navigator::start(host, MemoryStore::new(), NavigatorConfig::default())?;
//!
//! nav.subscribe(|entry| println!("now at {}", entry.address));
//! nav.push("/inbox/42", &serde_json::json!({"scroll": 0}))?;
//! nav.back()?;
//! # Ok(()) }
//! ```

pub mod error;
pub mod navigator;
pub mod sequencer;
pub mod snapshot;

pub use error::{NavError, Result};
pub use navigator::{Navigator, NavigatorConfig, SubscriptionId};
pub use sequencer::{Sequencer, SignalOutcome};
pub use snapshot::LegacySnapshot;

pub use wayline_core::{Address, NavigationEntry, RawSignal, SeqPos, StateId, StatePayload};
pub use wayline_host::{
    AdapterConfig, BackendMode, Capabilities, CommitMode, FrameStore, HostBackend,
    MemoryFrameStore, MemoryHost,
};
pub use wayline_store::{MemoryStore, SqliteStore, StateStore};
