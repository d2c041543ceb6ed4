//! Signal adaptation: one normalized raw-signal stream per backend.
//!
//! Native mode simply re-exports the host's own notification stream.
//! Emulated and legacy modes detect changes themselves: a cooperative
//! poller task watches the address fragment at a bounded tick interval,
//! comparing against the last observed value. There is no push
//! notification for plain fragment assignment, so bounded latency is the
//! contract here, not instant detection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use wayline_core::RawSignal;

use crate::backend::HostBackend;
use crate::capabilities::BackendMode;
use crate::error::{HostError, Result};

/// Tunables for emulated change detection.
///
/// The polling interval and the visibility-hint wakeup are configuration,
/// not correctness properties.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// How often the poller checks the fragment under emulation.
    pub poll_interval: Duration,
    /// Whether a nudge (visibility/focus hint) wakes the poller early.
    pub wake_on_nudge: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            wake_on_nudge: true,
        }
    }
}

/// Wraps whichever change-detection primitive the host offers behind one
/// raw-signal stream.
pub struct SignalAdapter {
    mode: BackendMode,
    poller: Option<JoinHandle<()>>,
    nudge: Arc<Notify>,
}

impl SignalAdapter {
    /// Probe the backend, select a mode, and start signal delivery.
    ///
    /// Returns the adapter handle and the normalized signal stream. The
    /// mode is fixed here for the lifetime of the layer.
    pub fn start(
        backend: Arc<dyn HostBackend>,
        config: &AdapterConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RawSignal>)> {
        let caps = backend.capabilities();
        let mode = BackendMode::select(&caps);
        tracing::debug!(%mode, "signal adapter starting");

        match mode {
            BackendMode::Native => {
                let rx = backend
                    .native_signals()
                    .ok_or_else(|| HostError::Unsupported("native signal stream".into()))?;
                Ok((
                    Self {
                        mode,
                        poller: None,
                        nudge: Arc::new(Notify::new()),
                    },
                    rx,
                ))
            }
            BackendMode::Emulated | BackendMode::Legacy => {
                let (tx, rx) = mpsc::unbounded_channel();
                let nudge = Arc::new(Notify::new());
                let poller = tokio::spawn(poll_fragment(
                    backend,
                    tx,
                    config.clone(),
                    Arc::clone(&nudge),
                ));
                Ok((
                    Self {
                        mode,
                        poller: Some(poller),
                        nudge,
                    },
                    rx,
                ))
            }
        }
    }

    /// The mode selected at startup.
    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Wake the poller for an immediate check.
    ///
    /// Hosts with visibility/focus events call this so a change made while
    /// the document was hidden is observed without waiting a full tick.
    pub fn nudge(&self) {
        self.nudge.notify_one();
    }

    /// Stop change detection. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
            tracing::debug!("fragment poller stopped");
        }
    }
}

impl Drop for SignalAdapter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The emulated detection loop.
///
/// Keeps the last observed fragment locally; on each check, a differing
/// fragment yields one raw signal carrying the new address and no
/// host-supplied state (the state store is consulted separately).
async fn poll_fragment(
    backend: Arc<dyn HostBackend>,
    tx: mpsc::UnboundedSender<RawSignal>,
    config: AdapterConfig,
    nudge: Arc<Notify>,
) {
    let mut last_fragment = backend.address().fragment().map(str::to_owned);

    loop {
        if config.wake_on_nudge {
            tokio::select! {
                _ = tokio::time::sleep(config.poll_interval) => {}
                _ = nudge.notified() => {
                    tracing::trace!("poller woken by nudge");
                }
            }
        } else {
            tokio::time::sleep(config.poll_interval).await;
        }

        let current = backend.address();
        let fragment = current.fragment().map(str::to_owned);
        if fragment != last_fragment {
            tracing::trace!(address = %current, "fragment change observed");
            last_fragment = fragment;
            if tx.send(RawSignal::bare(current)).is_err() {
                // Receiver dropped: the layer shut down.
                return;
            }
        }
    }
}
