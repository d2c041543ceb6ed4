//! # Wayline Testkit
//!
//! Testing utilities for Wayline.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a fully wired navigator over the in-memory host double,
//!   plus an event-recording subscriber and a bounded wait helper
//! - **Generators**: proptest strategies for addresses, fragments, and
//!   state payloads
//! - **Fault injection**: a store wrapper that rejects writes on demand
//!
//! ## Fixtures
//!
//! ```rust,ignore
//! use wayline_testkit::fixtures::TestFixture;
//!
//! let fx = TestFixture::emulated("/app#home");
//! fx.navigator.push("/app#a", &serde_json::json!({"n": 1}))?;
//! fx.host.external_set_fragment("b");
//! fx.wait_for_events(2).await;
//! assert_eq!(fx.log.addresses(), ["/app#b"]);
//! ```
//!
//! ## Property testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use wayline_testkit::generators::distinct_fragments;
//!
//! proptest! {
//!     #[test]
//!     fn fragments_stay_distinct(frags in distinct_fragments(2..8)) {
//!         let mut seen = std::collections::HashSet::new();
//!         prop_assert!(frags.iter().all(|f| seen.insert(f.clone())));
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{EventLog, FailingStore, TestFixture};
