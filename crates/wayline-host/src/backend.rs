//! HostBackend trait: the consumed host surface.
//!
//! Purely consumed capabilities; this layer exposes nothing back to the
//! host. Implementations wrap a real host environment or, in tests, the
//! [`MemoryHost`](crate::MemoryHost) double.

use tokio::sync::mpsc;

use wayline_core::{Address, RawSignal, StateId};

use crate::capabilities::Capabilities;
use crate::error::Result;

/// How an address commit relates to the host's history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Add a new position after the current one.
    Push,
    /// Rewrite the current position in place.
    Replace,
}

/// The consumed host surface.
///
/// All methods are synchronous: commits are non-reloading side effects that
/// complete before returning. Change notifications flow the other way,
/// through [`native_signals`](HostBackend::native_signals) when the host
/// supports them, or through fragment polling when it does not.
pub trait HostBackend: Send + Sync {
    /// The probed capability set. Stable for the lifetime of the document.
    fn capabilities(&self) -> Capabilities;

    /// Synchronous read of the current address.
    fn address(&self) -> Address;

    /// Set the address without reloading, optionally attaching a state
    /// reference when the host can carry one.
    fn commit(&self, address: &Address, state_id: Option<&StateId>, mode: CommitMode)
        -> Result<()>;

    /// Ask the host to move `delta` positions through its own stack.
    ///
    /// Meaningful only under a native backend; the resulting navigation is
    /// reported asynchronously through the signal stream.
    fn go(&self, delta: i64) -> Result<()>;

    /// Take the host's own position-change notification stream.
    ///
    /// Returns `Some` at most once, and only when
    /// [`Capabilities::native_state`] is set. `None` means the caller must
    /// detect changes itself by watching the fragment.
    fn native_signals(&self) -> Option<mpsc::UnboundedReceiver<RawSignal>>;
}
