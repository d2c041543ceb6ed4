//! # Wayline Store
//!
//! The state store: durable key/value storage for navigation state
//! payloads, keyed by [`StateId`](wayline_core::StateId).
//!
//! ## Overview
//!
//! The address representation of a host cannot always carry arbitrary data,
//! so payloads live here and entries reference them by id. The store is
//! abstracted behind the [`StateStore`] trait with two implementations:
//!
//! - [`SqliteStore`] - durable, survives a full document reload
//! - [`MemoryStore`] - volatile fallback when no durable surface exists
//!
//! ## Degradation contract
//!
//! When the host offers no durable storage, the layer falls back to
//! [`MemoryStore`] and state is lost across a full reload. That loss is
//! documented behavior, not an error; nothing in the store is allowed to
//! be fatal to the hosting document.
//!
//! ## Synchronous and total
//!
//! All store operations are synchronous. Absent lookups return `Ok(None)`,
//! never an error; `remove` of a missing key is a no-op.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::StateStore;
