//! In-memory host double.
//!
//! Simulates an address bar and, when configured as native, the host's own
//! history stack and notification stream. Signals are routed over channels
//! so tests exercise the same delivery path a real embedding would.

use std::sync::Mutex;

use tokio::sync::mpsc;

use wayline_core::{Address, RawSignal, StateId};

use crate::backend::{CommitMode, HostBackend};
use crate::capabilities::Capabilities;
use crate::error::Result;

/// In-memory host implementation.
pub struct MemoryHost {
    caps: Capabilities,
    inner: Mutex<HostInner>,
    signal_tx: mpsc::UnboundedSender<RawSignal>,
    signal_rx: Mutex<Option<mpsc::UnboundedReceiver<RawSignal>>>,
    echo_on_commit: Mutex<bool>,
}

struct HostInner {
    /// The simulated history stack: address plus attached state reference.
    stack: Vec<(Address, Option<StateId>)>,
    /// Index of the current position.
    index: usize,
}

impl MemoryHost {
    /// A host with full native capabilities.
    pub fn native(initial: impl Into<Address>) -> Self {
        Self::with_capabilities(initial, Capabilities::full())
    }

    /// A host offering only fragment watching plus durable storage.
    pub fn emulated(initial: impl Into<Address>) -> Self {
        Self::with_capabilities(initial, Capabilities::fragment_only())
    }

    /// A host with neither native notifications nor durable storage.
    pub fn legacy(initial: impl Into<Address>) -> Self {
        Self::with_capabilities(initial, Capabilities::bare())
    }

    /// A host with an explicit capability set.
    pub fn with_capabilities(initial: impl Into<Address>, caps: Capabilities) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        Self {
            caps,
            inner: Mutex::new(HostInner {
                stack: vec![(initial.into(), None)],
                index: 0,
            }),
            signal_tx,
            signal_rx: Mutex::new(Some(signal_rx)),
            echo_on_commit: Mutex::new(false),
        }
    }

    /// Make commits fire a notification echoing the committed position.
    ///
    /// Some native hosts notify for changes the caller itself just made;
    /// enabling this reproduces that echo path. Capabilities are probed
    /// once at layer startup, so set this before starting the layer.
    pub fn set_echo_on_commit(&self, echo: bool) {
        *self.echo_on_commit.lock().unwrap() = echo;
    }

    /// Simulate an externally driven address change: the user edits the
    /// address bar or types a fragment. Truncates any forward positions,
    /// exactly as a real address bar would.
    pub fn external_set(&self, address: Address) {
        let fire = {
            let mut inner = self.inner.lock().unwrap();
            let index = inner.index;
            inner.stack.truncate(index + 1);
            inner.stack.push((address.clone(), None));
            inner.index += 1;
            self.caps.native_state
        };
        if fire {
            let _ = self.signal_tx.send(RawSignal::bare(address));
        }
    }

    /// Simulate the user typing only a new fragment on the current address.
    pub fn external_set_fragment(&self, fragment: &str) {
        let address = self.address().with_fragment(fragment);
        self.external_set(address);
    }

    /// Simulate the user pressing the host's own back/forward controls.
    pub fn external_go(&self, delta: i64) {
        let fired = {
            let mut inner = self.inner.lock().unwrap();
            let target = clamp_index(inner.index, delta, inner.stack.len());
            if target == inner.index {
                None
            } else {
                inner.index = target;
                Some(inner.stack[target].clone())
            }
        };
        if let Some((address, state_id)) = fired {
            if self.caps.native_state {
                let _ = self.signal_tx.send(RawSignal { address, state_id });
            }
            // Without native notifications the address silently changed and
            // the fragment poller has to find it.
        }
    }

    /// Fire the spurious load-time notification some hosts deliver,
    /// carrying the address the document already has.
    pub fn fire_startup_echo(&self) {
        let _ = self.signal_tx.send(RawSignal::bare(self.address()));
    }

    /// Depth of the simulated stack.
    pub fn stack_len(&self) -> usize {
        self.inner.lock().unwrap().stack.len()
    }
}

fn clamp_index(index: usize, delta: i64, len: usize) -> usize {
    let target = index as i64 + delta;
    target.clamp(0, len.saturating_sub(1) as i64) as usize
}

impl HostBackend for MemoryHost {
    fn capabilities(&self) -> Capabilities {
        let mut caps = self.caps;
        caps.echoes_commits = caps.native_state && *self.echo_on_commit.lock().unwrap();
        caps
    }

    fn address(&self) -> Address {
        let inner = self.inner.lock().unwrap();
        inner.stack[inner.index].0.clone()
    }

    fn commit(
        &self,
        address: &Address,
        state_id: Option<&StateId>,
        mode: CommitMode,
    ) -> Result<()> {
        {
            let mut inner = self.inner.lock().unwrap();
            let index = inner.index;
            match mode {
                CommitMode::Push => {
                    inner.stack.truncate(index + 1);
                    inner.stack.push((address.clone(), state_id.copied()));
                    inner.index += 1;
                }
                CommitMode::Replace => {
                    inner.stack[index] = (address.clone(), state_id.copied());
                }
            }
        }
        if self.caps.native_state && *self.echo_on_commit.lock().unwrap() {
            let _ = self.signal_tx.send(RawSignal {
                address: address.clone(),
                state_id: state_id.copied(),
            });
        }
        Ok(())
    }

    fn go(&self, delta: i64) -> Result<()> {
        self.external_go(delta);
        Ok(())
    }

    fn native_signals(&self) -> Option<mpsc::UnboundedReceiver<RawSignal>> {
        if self.caps.native_state {
            self.signal_rx.lock().unwrap().take()
        } else {
            None
        }
    }
}
