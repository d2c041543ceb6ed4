//! The Navigator: the caller-facing navigation surface.
//!
//! One Navigator instance owns the process-scoped current entry and
//! position pair for the lifetime of the hosting document. Callers push
//! and replace entries, traverse, and subscribe to normalized change
//! events; the instance merges local calls with raw host signals through
//! the [`Sequencer`] and emits each distinct navigation exactly once, in
//! order.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;

use wayline_core::{Address, NavigationEntry, RawSignal, SeqPos, StateId, StatePayload};
use wayline_host::{
    AdapterConfig, BackendMode, CommitMode, FrameStore, HostBackend, SignalAdapter,
};
use wayline_store::StateStore;

use crate::error::Result;
use crate::sequencer::{Sequencer, SignalOutcome};
use crate::snapshot::LegacySnapshot;

/// Configuration for the Navigator.
#[derive(Debug, Clone, Default)]
pub struct NavigatorConfig {
    /// Change-detection tunables (polling interval, nudge wakeup).
    pub adapter: AdapterConfig,
}

/// Handle identifying one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&NavigationEntry) + Send + Sync>;

struct SubscriberTable {
    next: u64,
    entries: Vec<(SubscriptionId, Subscriber)>,
}

/// A mutation deferred because event delivery was in progress.
///
/// Re-entrant calls from inside a subscriber callback land here and are
/// applied after the current delivery completes, so `currentEntry` is
/// never mutated mid-emit.
enum QueuedOp {
    Push {
        address: Address,
        state_id: StateId,
        title: Option<String>,
    },
    Replace {
        address: Address,
        state_id: StateId,
        title: Option<String>,
        payload: StatePayload,
        previous: Option<StatePayload>,
    },
    Go(i64),
    Deliver(NavigationEntry),
}

struct NavState {
    seq: Sequencer,
    /// Set while subscriber callbacks are running.
    emitting: bool,
    queue: VecDeque<QueuedOp>,
}

/// The navigation layer facade.
///
/// Constructed once per document via [`Navigator::start`]; all callers
/// share the instance by handle rather than reaching for ambient globals.
pub struct Navigator<S: StateStore> {
    backend: Arc<dyn HostBackend>,
    store: S,
    mode: BackendMode,
    frame: Option<Arc<dyn FrameStore>>,
    state: Mutex<NavState>,
    subscribers: Mutex<SubscriberTable>,
    adapter: Mutex<Option<SignalAdapter>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<S: StateStore + 'static> Navigator<S> {
    /// Probe the backend, select a mode, and start the layer.
    ///
    /// Records the initial address (the reference for startup-echo
    /// suppression), starts signal adaptation, and spawns the pump task
    /// that drains raw signals serially. Requires a tokio runtime.
    pub fn start(
        backend: Arc<dyn HostBackend>,
        store: S,
        config: NavigatorConfig,
    ) -> Result<Arc<Self>> {
        Self::start_inner(backend, store, None, config)
    }

    /// Like [`start`](Self::start), with an auxiliary frame surface for
    /// legacy-mode durability. Ignored unless the selected mode is
    /// [`BackendMode::Legacy`].
    pub fn start_with_frame(
        backend: Arc<dyn HostBackend>,
        store: S,
        frame: Arc<dyn FrameStore>,
        config: NavigatorConfig,
    ) -> Result<Arc<Self>> {
        Self::start_inner(backend, store, Some(frame), config)
    }

    fn start_inner(
        backend: Arc<dyn HostBackend>,
        store: S,
        frame: Option<Arc<dyn FrameStore>>,
        config: NavigatorConfig,
    ) -> Result<Arc<Self>> {
        let caps = backend.capabilities();
        let mode = BackendMode::select(&caps);
        let initial = backend.address();
        tracing::debug!(%mode, address = %initial, "navigator starting");

        let mut seq = Sequencer::new(initial.clone());
        // Fragment polling observes our own writes; a native notification
        // stream does too only when the host echoes commits.
        seq.set_observes_own_writes(mode.tracks_own_stack() || caps.echoes_commits);

        let frame = if mode == BackendMode::Legacy { frame } else { None };
        if let Some(frame) = &frame {
            if let Some(blob) = frame.read()? {
                match LegacySnapshot::decode(&blob) {
                    Ok(snapshot) => {
                        for (id, bytes) in &snapshot.payloads {
                            store.put(id, &StatePayload::from_bytes(bytes.clone()))?;
                        }
                        seq.restore(snapshot.entries, snapshot.index, &initial);
                        tracing::debug!("legacy snapshot restored");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "discarding undecodable legacy snapshot")
                    }
                }
            }
        }

        let (adapter, mut rx) = SignalAdapter::start(Arc::clone(&backend), &config.adapter)?;

        let navigator = Arc::new(Self {
            backend,
            store,
            mode,
            frame,
            state: Mutex::new(NavState {
                seq,
                emitting: false,
                queue: VecDeque::new(),
            }),
            subscribers: Mutex::new(SubscriberTable {
                next: 0,
                entries: Vec::new(),
            }),
            adapter: Mutex::new(Some(adapter)),
            pump: Mutex::new(None),
        });

        let weak = Arc::downgrade(&navigator);
        let pump = tokio::spawn(async move {
            while let Some(sig) = rx.recv().await {
                let Some(nav) = weak.upgrade() else { break };
                nav.handle_raw_signal(sig);
            }
        });
        *navigator.pump.lock().unwrap() = Some(pump);

        Ok(navigator)
    }

    /// The mode selected at startup. Permanent.
    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Whether payloads survive a full document reload.
    pub fn durable(&self) -> bool {
        self.store.is_durable()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// Synchronous read of the current entry.
    pub fn current(&self) -> NavigationEntry {
        self.state.lock().unwrap().seq.current().clone()
    }

    /// The current entry's sequence position.
    pub fn position(&self) -> SeqPos {
        self.state.lock().unwrap().seq.position()
    }

    /// Snapshot of the tracked entry stack, oldest first.
    ///
    /// Authoritative under emulation; advisory under a native backend,
    /// where the host owns the real stack depth.
    pub fn entries(&self) -> Vec<NavigationEntry> {
        self.state.lock().unwrap().seq.entries().to_vec()
    }

    /// Decode the payload associated with the current entry.
    ///
    /// `Ok(None)` when no payload is recoverable for the entry, e.g. a
    /// user-typed fragment navigation.
    pub fn current_state<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let entry = self.current();
        let Some(payload) = self.store.get(&entry.state_id)? else {
            return Ok(None);
        };
        Ok(Some(payload.decode()?))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Push a new entry with an associated state payload.
    pub fn push<T: Serialize>(&self, url: impl Into<Address>, state: &T) -> Result<()> {
        self.push_titled(url, state, None)
    }

    /// Push a new entry with a title.
    ///
    /// The payload write commits first; if it fails the error is returned
    /// here and the current entry is untouched (no partial commit).
    pub fn push_titled<T: Serialize>(
        &self,
        url: impl Into<Address>,
        state: &T,
        title: Option<&str>,
    ) -> Result<()> {
        let address = url.into();
        let payload = StatePayload::encode(state)?;
        let state_id = StateId::random();
        self.store.put(&state_id, &payload)?;

        self.enqueue_or_apply(QueuedOp::Push {
            address,
            state_id,
            title: title.map(String::from),
        })
    }

    /// Replace the current entry in place.
    ///
    /// The payload is rewritten under the current entry's existing state
    /// id and the address updates without consuming a new back-position.
    pub fn replace<T: Serialize>(&self, url: impl Into<Address>, state: &T) -> Result<()> {
        self.replace_titled(url, state, None)
    }

    /// Replace the current entry with a title.
    pub fn replace_titled<T: Serialize>(
        &self,
        url: impl Into<Address>,
        state: &T,
        title: Option<&str>,
    ) -> Result<()> {
        let address = url.into();
        let payload = StatePayload::encode(state)?;
        let state_id = self.state.lock().unwrap().seq.current().state_id;

        // Keep the prior payload so a failed address commit can roll the
        // in-place write back.
        let previous = self.store.get(&state_id)?;
        self.store.put(&state_id, &payload)?;

        self.enqueue_or_apply(QueuedOp::Replace {
            address,
            state_id,
            title: title.map(String::from),
            payload,
            previous,
        })
    }

    /// Move one position back.
    pub fn back(&self) -> Result<()> {
        self.go(-1)
    }

    /// Move one position forward.
    pub fn forward(&self) -> Result<()> {
        self.go(1)
    }

    /// Move `n` positions back.
    pub fn back_by(&self, n: u64) -> Result<()> {
        self.go(-(n as i64))
    }

    /// Move `n` positions forward.
    pub fn forward_by(&self, n: u64) -> Result<()> {
        self.go(n as i64)
    }

    /// Move `delta` positions through history.
    ///
    /// Under a native backend the host owns the stack: the move is
    /// requested and the resulting navigation arrives through the signal
    /// path. Under emulation the layer's own stack is authoritative and
    /// the move applies synchronously, clamped at either end.
    pub fn go(&self, delta: i64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        self.enqueue_or_apply(QueuedOp::Go(delta))
    }

    /// Drop payloads no tracked entry references.
    pub fn compact(&self) -> Result<usize> {
        let live = self.state.lock().unwrap().seq.live_ids();
        Ok(self.store.prune_except(&live)?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────────────────

    /// Register a change subscriber.
    ///
    /// The callback receives each entry as it becomes current, in order.
    /// A panicking callback is isolated and logged; delivery continues to
    /// the remaining subscribers.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&NavigationEntry) + Send + Sync + 'static,
    {
        let mut table = self.subscribers.lock().unwrap();
        let id = SubscriptionId(table.next);
        table.next += 1;
        table.entries.push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscriber. Returns whether the handle was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut table = self.subscribers.lock().unwrap();
        let before = table.entries.len();
        table.entries.retain(|(sid, _)| *sid != id);
        table.entries.len() != before
    }

    /// Wake the fragment poller for an immediate check.
    ///
    /// Call on visibility/focus hints so a change made while the document
    /// was hidden is observed without waiting a full tick.
    pub fn nudge(&self) {
        if let Some(adapter) = &*self.adapter.lock().unwrap() {
            adapter.nudge();
        }
    }

    /// Stop signal processing. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        if let Some(pump) = self.pump.lock().unwrap().take() {
            pump.abort();
        }
        if let Some(mut adapter) = self.adapter.lock().unwrap().take() {
            adapter.shutdown();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    /// Apply a mutation now, or queue it when delivery is in progress.
    fn enqueue_or_apply(&self, op: QueuedOp) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        if st.emitting {
            st.queue.push_back(op);
            return Ok(());
        }
        let event = self.apply_op(&mut st, op)?;
        if let Some(entry) = event {
            st.emitting = true;
            drop(st);
            self.deliver_and_drain(entry);
        }
        Ok(())
    }

    /// Apply one operation under the state lock.
    ///
    /// Returns the event to deliver, if the operation produced one. Push
    /// and replace never emit for the caller's own change; only traversal
    /// under emulation and queued signal deliveries do.
    fn apply_op(&self, st: &mut NavState, op: QueuedOp) -> Result<Option<NavigationEntry>> {
        match op {
            QueuedOp::Push {
                address,
                state_id,
                title,
            } => {
                if let Err(e) =
                    self.backend
                        .commit(&address, Some(&state_id), CommitMode::Push)
                {
                    // Roll the payload write back so no orphan survives a
                    // rejected commit.
                    if let Err(remove_err) = self.store.remove(&state_id) {
                        tracing::warn!(error = %remove_err, "payload rollback failed");
                    }
                    return Err(e.into());
                }
                let (entry, pruned) = st.seq.record_push(address, state_id, title);
                self.drop_payloads(&pruned);
                tracing::debug!(address = %entry.address, seq = entry.seq.value(), "pushed entry");
                self.checkpoint(st);
                Ok(None)
            }
            QueuedOp::Replace {
                address,
                state_id,
                title,
                payload,
                mut previous,
            } => {
                // A queued replace may land after the current entry moved.
                // The eager write went under the entry that was current at
                // call time; put that entry's payload back, then rewrite
                // under whatever id is current now.
                let current_id = st.seq.current().state_id;
                if current_id != state_id {
                    tracing::debug!("queued replace retargeted to the entry now current");
                    match previous.take() {
                        Some(old) => self.store.put(&state_id, &old)?,
                        None => self.store.remove(&state_id)?,
                    }
                    previous = self.store.get(&current_id)?;
                    self.store.put(&current_id, &payload)?;
                }
                if let Err(e) =
                    self.backend
                        .commit(&address, Some(&current_id), CommitMode::Replace)
                {
                    match previous {
                        Some(old) => {
                            if let Err(restore_err) = self.store.put(&current_id, &old) {
                                tracing::warn!(error = %restore_err, "payload rollback failed");
                            }
                        }
                        None => {
                            if let Err(remove_err) = self.store.remove(&current_id) {
                                tracing::warn!(error = %remove_err, "payload rollback failed");
                            }
                        }
                    }
                    return Err(e.into());
                }
                let entry = st.seq.record_replace(address, title);
                tracing::debug!(address = %entry.address, "replaced current entry");
                self.checkpoint(st);
                Ok(None)
            }
            QueuedOp::Go(delta) => {
                if !self.mode.tracks_own_stack() {
                    // The host owns the stack; the navigation comes back
                    // through the signal path.
                    self.backend.go(delta)?;
                    return Ok(None);
                }
                let Some(target) = st.seq.peek_traverse(delta) else {
                    tracing::debug!(delta, "traversal clamped to a no-op");
                    return Ok(None);
                };
                let target_entry = st.seq.entry_at(target).clone();
                self.backend.commit(
                    &target_entry.address,
                    Some(&target_entry.state_id),
                    CommitMode::Replace,
                )?;
                let entry = st.seq.jump_to(target);
                self.checkpoint(st);
                Ok(Some(entry))
            }
            QueuedOp::Deliver(entry) => Ok(Some(entry)),
        }
    }

    /// Classify one raw signal from the adapter. Runs on the pump task.
    fn handle_raw_signal(&self, sig: RawSignal) {
        let mut st = self.state.lock().unwrap();
        match st.seq.on_signal(&sig) {
            SignalOutcome::StartupEcho => {
                tracing::debug!(address = %sig.address, "startup echo swallowed");
            }
            SignalOutcome::Echo => {
                tracing::trace!(address = %sig.address, "echo of local write swallowed");
            }
            SignalOutcome::Duplicate => {
                tracing::trace!(address = %sig.address, "duplicate signal discarded");
            }
            SignalOutcome::Navigated { entry, pruned } => {
                self.drop_payloads(&pruned);
                self.checkpoint(&mut st);
                if st.emitting {
                    st.queue.push_back(QueuedOp::Deliver(entry));
                } else {
                    st.emitting = true;
                    drop(st);
                    self.deliver_and_drain(entry);
                }
            }
        }
    }

    /// Deliver one event, then apply any operations queued during
    /// delivery until the queue drains.
    fn deliver_and_drain(&self, first: NavigationEntry) {
        let mut next = Some(first);
        loop {
            if let Some(entry) = next.take() {
                self.notify_subscribers(&entry);
            }
            let mut st = self.state.lock().unwrap();
            match st.queue.pop_front() {
                None => {
                    st.emitting = false;
                    return;
                }
                Some(op) => match self.apply_op(&mut st, op) {
                    Ok(event) => {
                        drop(st);
                        next = event;
                    }
                    Err(e) => {
                        drop(st);
                        tracing::error!(error = %e, "queued navigation op failed");
                    }
                },
            }
        }
    }

    fn notify_subscribers(&self, entry: &NavigationEntry) {
        let subscribers: Vec<(SubscriptionId, Subscriber)> = self
            .subscribers
            .lock()
            .unwrap()
            .entries
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();

        tracing::debug!(
            address = %entry.address,
            seq = entry.seq.value(),
            subscribers = subscribers.len(),
            "delivering navigation event"
        );
        for (id, callback) in subscribers {
            if catch_unwind(AssertUnwindSafe(|| callback(entry))).is_err() {
                tracing::error!(subscriber = id.0, "subscriber panicked during delivery");
            }
        }
    }

    fn drop_payloads(&self, pruned: &[StateId]) {
        for id in pruned {
            if let Err(e) = self.store.remove(id) {
                tracing::warn!(error = %e, state_id = %id, "failed to drop truncated payload");
            }
        }
    }

    /// Best-effort legacy checkpoint; durability only, never signaling.
    fn checkpoint(&self, st: &mut NavState) {
        let Some(frame) = &self.frame else { return };

        let entries = st.seq.entries().to_vec();
        let mut payloads = Vec::with_capacity(entries.len());
        for entry in &entries {
            match self.store.get(&entry.state_id) {
                Ok(Some(payload)) => payloads.push((entry.state_id, payload.as_bytes().to_vec())),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "checkpoint skipped a payload");
                }
            }
        }
        let snapshot = LegacySnapshot {
            entries,
            index: st.seq.index(),
            payloads,
        };
        match snapshot.encode() {
            Ok(blob) => {
                if let Err(e) = frame.write(&blob) {
                    tracing::warn!(error = %e, "legacy checkpoint write failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "legacy checkpoint encode failed"),
        }
    }
}

impl<S: StateStore> Drop for Navigator<S> {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.lock().unwrap().take() {
            pump.abort();
        }
        if let Some(mut adapter) = self.adapter.lock().unwrap().take() {
            adapter.shutdown();
        }
    }
}
