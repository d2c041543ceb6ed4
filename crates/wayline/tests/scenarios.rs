//! End-to-end scenarios over the in-memory host double.
//!
//! Each test runs the full pipeline: backend commit, signal adaptation,
//! sequencing, storage, and subscriber delivery. Event assertions use a
//! bounded wait, never a fixed sleep, except where the assertion is that
//! nothing arrives.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use wayline::{
    AdapterConfig, Address, FrameStore, HostBackend, MemoryFrameStore, MemoryHost, MemoryStore,
    NavigationEntry, Navigator, NavigatorConfig, StateId, StatePayload, StateStore,
};
use wayline_store::{Result as StoreResult, StoreError};

fn fast_config() -> NavigatorConfig {
    NavigatorConfig {
        adapter: AdapterConfig {
            poll_interval: Duration::from_millis(5),
            wake_on_nudge: true,
        },
    }
}

/// Records delivered entries for assertion.
#[derive(Clone, Default)]
struct EventLog {
    entries: Arc<Mutex<Vec<NavigationEntry>>>,
}

impl EventLog {
    fn attach<S: StateStore + 'static>(nav: &Navigator<S>) -> Self {
        let log = Self::default();
        let sink = Arc::clone(&log.entries);
        nav.subscribe(move |entry| sink.lock().unwrap().push(entry.clone()));
        log
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    fn addresses(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.address.as_str().to_string())
            .collect()
    }
}

/// Poll until `predicate` holds or the deadline passes.
async fn wait_until(deadline: Duration, predicate: impl Fn() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    predicate()
}

/// Store wrapper that rejects writes on demand.
struct FailingStore {
    inner: MemoryStore,
    fail_puts: Mutex<bool>,
}

impl FailingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_puts: Mutex::new(false),
        }
    }

    fn fail_puts(&self, fail: bool) {
        *self.fail_puts.lock().unwrap() = fail;
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

// ─────────────────────────────────────────────────────────────────────────
// Echo suppression and delivery exactness
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_own_writes_never_echo_back_as_events() {
    let host = Arc::new(MemoryHost::native("/app"));
    // The host notifies even for changes the caller itself made.
    host.set_echo_on_commit(true);
    let nav = Navigator::start(host.clone(), MemoryStore::new(), fast_config()).unwrap();
    let log = EventLog::attach(&nav);

    nav.push("/app/a", &json!({"n": 1})).unwrap();
    nav.push("/app/b", &json!({"n": 2})).unwrap();
    nav.replace("/app/b2", &json!({"n": 3})).unwrap();

    // Give the echoes time to arrive and be swallowed.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(log.len(), 0, "local writes must not surface as events");

    // A genuinely external navigation still comes through, exactly once.
    host.external_go(-1);
    assert!(wait_until(Duration::from_secs(1), || log.len() == 1).await);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(log.addresses(), ["/app/a"]);
}

#[tokio::test]
async fn test_startup_echo_swallowed_but_pipeline_stays_live() {
    let host = Arc::new(MemoryHost::native("/app"));
    let nav = Navigator::start(host.clone(), MemoryStore::new(), fast_config()).unwrap();
    let log = EventLog::attach(&nav);

    host.fire_startup_echo();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(log.len(), 0, "load-time echo must be silent");

    host.external_set(Address::new("/app#next"));
    assert!(wait_until(Duration::from_secs(1), || log.len() == 1).await);
    assert_eq!(log.addresses(), ["/app#next"]);
}

// ─────────────────────────────────────────────────────────────────────────
// State round-trips across traversal
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_state_restored_across_back_and_forward() {
    let host = Arc::new(MemoryHost::native("/inbox"));
    let nav = Navigator::start(host.clone(), MemoryStore::new(), fast_config()).unwrap();
    let log = EventLog::attach(&nav);

    nav.push("/inbox/42", &json!({"scroll": 120})).unwrap();
    nav.push("/inbox/43", &json!({"scroll": 480})).unwrap();

    // The host owns the stack in native mode; traversal lands async.
    nav.back().unwrap();
    assert!(wait_until(Duration::from_secs(1), || log.len() == 1).await);
    assert_eq!(nav.current().address.as_str(), "/inbox/42");
    assert_eq!(
        nav.current_state::<serde_json::Value>().unwrap(),
        Some(json!({"scroll": 120}))
    );

    nav.forward().unwrap();
    assert!(wait_until(Duration::from_secs(1), || log.len() == 2).await);
    assert_eq!(
        nav.current_state::<serde_json::Value>().unwrap(),
        Some(json!({"scroll": 480}))
    );
}

#[tokio::test]
async fn test_entry_without_payload_reads_none() {
    let host = Arc::new(MemoryHost::native("/app"));
    let nav = Navigator::start(host.clone(), MemoryStore::new(), fast_config()).unwrap();
    let log = EventLog::attach(&nav);

    // A user-typed fragment has no payload anywhere.
    host.external_set(Address::new("/app#typed"));
    assert!(wait_until(Duration::from_secs(1), || log.len() == 1).await);
    assert_eq!(nav.current_state::<serde_json::Value>().unwrap(), None);
}

// ─────────────────────────────────────────────────────────────────────────
// Emulated detection: ordering and duplicate collapse
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_emulated_external_changes_arrive_in_order() {
    let host = Arc::new(MemoryHost::emulated("/app#home"));
    let nav = Navigator::start(host.clone(), MemoryStore::new(), fast_config()).unwrap();
    assert_eq!(nav.mode().to_string(), "emulated");
    let log = EventLog::attach(&nav);

    for frag in ["s1", "s2", "s3"] {
        host.external_set_fragment(frag);
        let want = log.len() + 1;
        assert!(wait_until(Duration::from_secs(1), || log.len() >= want).await);
    }

    assert_eq!(log.addresses(), ["/app#s1", "/app#s2", "/app#s3"]);
}

#[tokio::test]
async fn test_repeated_identical_fragment_collapses() {
    let host = Arc::new(MemoryHost::emulated("/app#home"));
    let nav = Navigator::start(host.clone(), MemoryStore::new(), fast_config()).unwrap();
    let log = EventLog::attach(&nav);

    host.external_set_fragment("x");
    assert!(wait_until(Duration::from_secs(1), || log.len() == 1).await);

    // The same fragment again is not a change.
    host.external_set_fragment("x");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(log.len(), 1);

    host.external_set_fragment("y");
    assert!(wait_until(Duration::from_secs(1), || log.len() == 2).await);
    assert_eq!(log.addresses(), ["/app#x", "/app#y"]);
}

#[tokio::test]
async fn test_emulated_traversal_is_synchronous() {
    let host = Arc::new(MemoryHost::emulated("/app#home"));
    let nav = Navigator::start(host.clone(), MemoryStore::new(), fast_config()).unwrap();

    nav.push("/app#a", &json!({"n": 1})).unwrap();
    nav.push("/app#b", &json!({"n": 2})).unwrap();
    let log = EventLog::attach(&nav);

    // The layer owns the stack: the move applies before back() returns.
    nav.back().unwrap();
    assert_eq!(nav.current().address.as_str(), "/app#a");
    assert_eq!(log.addresses(), ["/app#a"]);
    assert_eq!(host.address().as_str(), "/app#a");

    // The poller's observation of that write is an echo, not a second event.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn test_traversal_past_the_edge_is_a_noop() {
    let host = Arc::new(MemoryHost::emulated("/app#home"));
    let nav = Navigator::start(host.clone(), MemoryStore::new(), fast_config()).unwrap();
    let log = EventLog::attach(&nav);

    nav.back_by(5).unwrap();
    nav.forward_by(5).unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(log.len(), 0);
    assert_eq!(nav.current().address.as_str(), "/app#home");
}

// ─────────────────────────────────────────────────────────────────────────
// Replace semantics
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_replaced_entry_is_unreachable_by_back() {
    let host = Arc::new(MemoryHost::native("/app"));
    let nav = Navigator::start(host.clone(), MemoryStore::new(), fast_config()).unwrap();

    nav.push("/step1", &json!({"n": 1})).unwrap();
    nav.push("/step2-draft", &json!({"n": 2})).unwrap();
    let depth = host.stack_len();
    nav.replace("/step2-final", &json!({"n": 3})).unwrap();
    assert_eq!(host.stack_len(), depth, "replace must not grow the stack");

    let log = EventLog::attach(&nav);
    host.external_go(-1);
    assert!(wait_until(Duration::from_secs(1), || log.len() == 1).await);

    // Back lands on step1; the superseded draft no longer exists anywhere.
    assert_eq!(log.addresses(), ["/step1"]);
    assert!(nav
        .entries()
        .iter()
        .all(|e| e.address.as_str() != "/step2-draft"));
}

#[tokio::test]
async fn test_replace_rewrites_payload_under_same_id() {
    let host = Arc::new(MemoryHost::native("/app"));
    let store = Arc::new(MemoryStore::new());
    let nav = Navigator::start(host.clone(), Arc::clone(&store), fast_config()).unwrap();

    nav.push("/form", &json!({"field": ""})).unwrap();
    let id = nav.current().state_id;
    nav.replace("/form", &json!({"field": "typed"})).unwrap();

    assert_eq!(nav.current().state_id, id);
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(
        nav.current_state::<serde_json::Value>().unwrap(),
        Some(json!({"field": "typed"}))
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Sequence positions
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_positions_increase_across_the_event_stream() {
    let host = Arc::new(MemoryHost::emulated("/app#home"));
    let nav = Navigator::start(host.clone(), MemoryStore::new(), fast_config()).unwrap();
    let log = EventLog::attach(&nav);

    host.external_set_fragment("a");
    assert!(wait_until(Duration::from_secs(1), || log.len() == 1).await);
    host.external_set_fragment("b");
    assert!(wait_until(Duration::from_secs(1), || log.len() == 2).await);

    let seqs: Vec<u64> = log
        .entries
        .lock()
        .unwrap()
        .iter()
        .map(|e| e.seq.value())
        .collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}

// ─────────────────────────────────────────────────────────────────────────
// Storage failure: no partial commit
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_payload_write_leaves_position_untouched() {
    let host = Arc::new(MemoryHost::native("/app"));
    let store = Arc::new(FailingStore::new());
    let nav = Navigator::start(host.clone(), Arc::clone(&store), fast_config()).unwrap();

    nav.push("/a", &json!({"n": 1})).unwrap();
    let before = nav.current();
    let depth = host.stack_len();

    store.fail_puts(true);
    assert!(nav.push("/b", &json!({"n": 2})).is_err());

    // The error surfaced to the caller and nothing moved: no event, no
    // host commit, no current-entry change, no stray payload.
    assert!(nav.current().same_position(&before));
    assert_eq!(host.stack_len(), depth);
    assert_eq!(store.len().unwrap(), 1);

    // The layer works again once the store recovers.
    store.fail_puts(false);
    nav.push("/b", &json!({"n": 2})).unwrap();
    assert_eq!(nav.current().address.as_str(), "/b");
}

#[tokio::test]
async fn test_replace_failure_keeps_previous_payload() {
    let host = Arc::new(MemoryHost::native("/app"));
    let store = Arc::new(FailingStore::new());
    let nav = Navigator::start(host.clone(), Arc::clone(&store), fast_config()).unwrap();

    nav.push("/form", &json!({"field": "saved"})).unwrap();

    store.fail_puts(true);
    assert!(nav.replace("/form", &json!({"field": "lost"})).is_err());
    store.fail_puts(false);

    assert_eq!(
        nav.current_state::<serde_json::Value>().unwrap(),
        Some(json!({"field": "saved"}))
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Legacy mode: checkpoint and restore
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_legacy_snapshot_survives_reload() {
    let frame = Arc::new(MemoryFrameStore::new());

    {
        let host = Arc::new(MemoryHost::legacy("/app#home"));
        let nav = Navigator::start_with_frame(
            host.clone(),
            MemoryStore::new(),
            frame.clone(),
            fast_config(),
        )
        .unwrap();
        assert_eq!(nav.mode().to_string(), "legacy");

        nav.push("/app#a", &json!({"n": 1})).unwrap();
        nav.push("/app#b", &json!({"n": 2})).unwrap();
        nav.shutdown();
    }

    // A reload rebuilds the document at the last committed address with a
    // fresh volatile store; the frame carries the stack across.
    let host = Arc::new(MemoryHost::legacy("/app#b"));
    let nav = Navigator::start_with_frame(
        host.clone(),
        MemoryStore::new(),
        frame.clone(),
        fast_config(),
    )
    .unwrap();

    assert_eq!(nav.entries().len(), 3);
    assert_eq!(nav.current().address.as_str(), "/app#b");
    assert_eq!(
        nav.current_state::<serde_json::Value>().unwrap(),
        Some(json!({"n": 2}))
    );

    // Traversal works over the restored stack.
    nav.back().unwrap();
    assert_eq!(nav.current().address.as_str(), "/app#a");
    assert_eq!(
        nav.current_state::<serde_json::Value>().unwrap(),
        Some(json!({"n": 1}))
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Durable storage
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sqlite_payloads_survive_the_layer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    let id = {
        let host = Arc::new(MemoryHost::emulated("/app#home"));
        let store = wayline::SqliteStore::open(&path).unwrap();
        let nav = Navigator::start(host, store, fast_config()).unwrap();
        assert!(nav.durable());

        nav.push("/app#doc", &json!({"cursor": 17})).unwrap();
        let id = nav.current().state_id;
        nav.shutdown();
        id
    };

    // A reload rebuilds everything except the database file.
    let store = wayline::SqliteStore::open(&path).unwrap();
    let payload = store.get(&id).unwrap().expect("payload must survive");
    assert_eq!(
        payload.decode::<serde_json::Value>().unwrap(),
        json!({"cursor": 17})
    );
}

#[tokio::test]
async fn test_corrupt_legacy_snapshot_is_discarded() {
    let frame = Arc::new(MemoryFrameStore::new());
    frame.write(b"not a snapshot").unwrap();

    let host = Arc::new(MemoryHost::legacy("/app#home"));
    let nav = Navigator::start_with_frame(
        host.clone(),
        MemoryStore::new(),
        frame.clone(),
        fast_config(),
    )
    .unwrap();

    // Initialization survives; the layer just starts from scratch.
    assert_eq!(nav.entries().len(), 1);
    assert_eq!(nav.current().address.as_str(), "/app#home");
}
