//! Test fixtures for navigation scenarios.
//!
//! A [`TestFixture`] wires a navigator over the in-memory host double with
//! a fast poll interval and an event-recording subscriber already
//! attached, so a test gets straight to the scenario.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use wayline::{Navigator, NavigatorConfig};
use wayline_core::{NavigationEntry, StateId, StatePayload};
use wayline_host::{AdapterConfig, MemoryFrameStore, MemoryHost};
use wayline_store::{MemoryStore, Result as StoreResult, StateStore, StoreError};

/// Poll interval used by fixtures. Fast enough that bounded waits finish
/// quickly, slow enough not to burn test CPU.
pub const FIXTURE_POLL: Duration = Duration::from_millis(5);

/// Records every delivered entry for later assertion.
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<NavigationEntry>>>,
}

impl EventLog {
    /// Subscribe this log to a navigator.
    pub fn attach<S: StateStore + 'static>(nav: &Navigator<S>) -> Self {
        let log = Self::default();
        let sink = Arc::clone(&log.entries);
        nav.subscribe(move |entry| sink.lock().unwrap().push(entry.clone()));
        log
    }

    /// Number of events delivered so far.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether nothing has been delivered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The delivered entries, oldest first.
    pub fn entries(&self) -> Vec<NavigationEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Just the delivered addresses, oldest first.
    pub fn addresses(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.address.as_str().to_string())
            .collect()
    }
}

/// A fully wired navigation scenario over the in-memory host.
pub struct TestFixture {
    pub host: Arc<MemoryHost>,
    pub store: Arc<MemoryStore>,
    pub navigator: Arc<Navigator<Arc<MemoryStore>>>,
    pub log: EventLog,
    /// Present only for legacy fixtures.
    pub frame: Option<Arc<MemoryFrameStore>>,
}

impl TestFixture {
    /// A navigator over a host with full native capabilities.
    pub fn native(initial: &str) -> Self {
        Self::build(Arc::new(MemoryHost::native(initial)), None)
    }

    /// A navigator over a fragment-only host with durable storage.
    pub fn emulated(initial: &str) -> Self {
        Self::build(Arc::new(MemoryHost::emulated(initial)), None)
    }

    /// A navigator over a bare host, checkpointing into a frame store.
    pub fn legacy(initial: &str) -> Self {
        Self::build(
            Arc::new(MemoryHost::legacy(initial)),
            Some(Arc::new(MemoryFrameStore::new())),
        )
    }

    /// A legacy navigator restoring from an existing frame, as after a
    /// full document reload.
    pub fn legacy_with_frame(initial: &str, frame: Arc<MemoryFrameStore>) -> Self {
        Self::build(Arc::new(MemoryHost::legacy(initial)), Some(frame))
    }

    fn build(host: Arc<MemoryHost>, frame: Option<Arc<MemoryFrameStore>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = NavigatorConfig {
            adapter: AdapterConfig {
                poll_interval: FIXTURE_POLL,
                wake_on_nudge: true,
            },
        };
        let navigator = match &frame {
            Some(frame) => Navigator::start_with_frame(
                host.clone(),
                Arc::clone(&store),
                frame.clone(),
                config,
            ),
            None => Navigator::start(host.clone(), Arc::clone(&store), config),
        }
        .expect("fixture navigator must start");
        let log = EventLog::attach(&navigator);
        Self {
            host,
            store,
            navigator,
            log,
            frame,
        }
    }

    /// Wait until `count` events have been delivered. Panics after a
    /// second, which for the fixture poll interval means something is
    /// wrong with the pipeline, not with timing.
    pub async fn wait_for_events(&self, count: usize) {
        let ok = wait_until(Duration::from_secs(1), || self.log.len() >= count).await;
        assert!(
            ok,
            "expected {} events, saw {} ({:?})",
            count,
            self.log.len(),
            self.log.addresses()
        );
    }

    /// Wait long enough for any pending signal to have been processed,
    /// for asserting that nothing further arrives.
    pub async fn settle(&self) {
        tokio::time::sleep(FIXTURE_POLL * 10).await;
    }
}

/// Poll until `predicate` holds or the deadline passes.
pub async fn wait_until(deadline: Duration, predicate: impl Fn() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    predicate()
}

/// Store wrapper that rejects writes on demand, for exercising the
/// no-partial-commit contract.
pub struct FailingStore {
    inner: MemoryStore,
    fail_puts: Mutex<bool>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_puts: Mutex::new(false),
        }
    }

    /// Flip write rejection on or off.
    pub fn fail_puts(&self, fail: bool) {
        *self.fail_puts.lock().unwrap() = fail;
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for FailingStore {
    fn put(&self, id: &StateId, payload: &StatePayload) -> StoreResult<()> {
        if *self.fail_puts.lock().unwrap() {
            return Err(StoreError::Serialization("injected write failure".into()));
        }
        self.inner.put(id, payload)
    }

    fn get(&self, id: &StateId) -> StoreResult<Option<StatePayload>> {
        self.inner.get(id)
    }

    fn remove(&self, id: &StateId) -> StoreResult<()> {
        self.inner.remove(id)
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn len(&self) -> StoreResult<usize> {
        self.inner.len()
    }

    fn prune_except(&self, keep: &[StateId]) -> StoreResult<usize> {
        self.inner.prune_except(keep)
    }
}
