//! The synchronization core: deduplication and sequencing.
//!
//! Merges the effects of local push/replace calls with raw signals from
//! the host into one coherent, de-duplicated stream. Signals that are mere
//! echoes of a change this layer itself made are swallowed; genuinely
//! external navigation (the user clicking back/forward, editing the
//! address bar, a typed fragment) comes back as exactly one
//! [`SignalOutcome::Navigated`].
//!
//! This module is a pure state machine: no I/O, no locking. The caller
//! serializes access to it.

use std::collections::VecDeque;

use wayline_core::{Address, NavigationEntry, RawSignal, SeqPos, StateId};

/// A mark armed after a local write: a signal matching this position is
/// the detection mechanism reflecting our own change back at us.
#[derive(Debug, Clone)]
struct EchoMark {
    address: Address,
    state_id: StateId,
}

/// What a raw signal turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The spurious load-time notification some backends fire, carrying
    /// the address the document already had. Swallowed.
    StartupEcho,
    /// The backend reflecting a change this layer just made. Swallowed.
    Echo,
    /// Same position the layer already considers current. Swallowed.
    Duplicate,
    /// A genuine externally driven navigation.
    Navigated {
        /// The entry that became current.
        entry: NavigationEntry,
        /// State ids truncated out of the tracked stack by this signal.
        pruned: Vec<StateId>,
    },
}

/// Deduplicator & sequencer state.
///
/// Owns the tracked entry stack, the current index, the monotonic position
/// counter, and the echo markers.
pub struct Sequencer {
    entries: Vec<NavigationEntry>,
    index: usize,
    /// High-water mark of locally issued positions. Never decreases, even
    /// when the current entry moves to an older position.
    last_issued: SeqPos,
    /// Whether the detection mechanism observes this layer's own writes
    /// (fragment polling does; a host that only notifies for traversal
    /// does not). Off means no echo marks are ever armed.
    observes_own_writes: bool,
    /// Expected reflections of local writes, oldest first. A polling
    /// detector may coalesce several writes into one observation, so a
    /// match consumes the matching mark and every older one.
    awaiting_echo: VecDeque<EchoMark>,
    /// The address recorded at initialization; present until the first
    /// signal arrives or the first local mutation happens.
    startup: Option<Address>,
}

impl Sequencer {
    /// Initialize at the host's current address.
    ///
    /// The initial entry gets a synthetic state id derived from the
    /// address; there is no payload for it until the caller replaces it.
    pub fn new(initial: Address) -> Self {
        let entry = NavigationEntry::new(
            initial.clone(),
            StateId::derive(&initial),
            None,
            SeqPos(1),
        );
        Self {
            entries: vec![entry],
            index: 0,
            last_issued: SeqPos(1),
            observes_own_writes: true,
            awaiting_echo: VecDeque::new(),
            startup: Some(initial),
        }
    }

    /// Configure whether local writes reflect back through the signal
    /// stream. Defaults to on; a backend whose notifications fire only
    /// for genuine traversal turns it off, so a later signal matching an
    /// old local write is recognized as real navigation.
    pub fn set_observes_own_writes(&mut self, observes: bool) {
        self.observes_own_writes = observes;
        if !observes {
            self.awaiting_echo.clear();
        }
    }

    /// The entry that is current right now.
    pub fn current(&self) -> &NavigationEntry {
        &self.entries[self.index]
    }

    /// The current entry's sequence position.
    pub fn position(&self) -> SeqPos {
        self.current().seq
    }

    /// Snapshot of the tracked stack, oldest first.
    pub fn entries(&self) -> &[NavigationEntry] {
        &self.entries
    }

    /// Index of the current entry within [`entries`](Self::entries).
    pub fn index(&self) -> usize {
        self.index
    }

    /// State ids of every tracked entry.
    pub fn live_ids(&self) -> Vec<StateId> {
        self.entries.iter().map(|e| e.state_id).collect()
    }

    /// Record a caller-initiated push.
    ///
    /// Truncates forward entries, stamps the next position, and arms the
    /// echo marker. Returns the new entry and the state ids that fell out
    /// of the stack.
    pub fn record_push(
        &mut self,
        address: Address,
        state_id: StateId,
        title: Option<String>,
    ) -> (NavigationEntry, Vec<StateId>) {
        self.startup = None;
        let pruned = self.truncate_forward();

        self.last_issued = self.last_issued.next();
        let entry = NavigationEntry::new(address, state_id, title, self.last_issued);
        self.arm_echo(&entry);
        self.entries.push(entry.clone());
        self.index = self.entries.len() - 1;
        (entry, pruned)
    }

    /// Record a caller-initiated replace.
    ///
    /// The current entry is superseded in place: same state id, same
    /// sequence position, new address/title. No new back-position is
    /// consumed.
    pub fn record_replace(&mut self, address: Address, title: Option<String>) -> NavigationEntry {
        self.startup = None;
        let current = self.current();
        let entry = NavigationEntry::new(address, current.state_id, title, current.seq);
        self.arm_echo(&entry);
        self.entries[self.index] = entry.clone();
        entry
    }

    /// Resolve a traversal to its target index, clamped to the stack
    /// bounds. `None` when the move is a no-op.
    pub fn peek_traverse(&self, delta: i64) -> Option<usize> {
        let target = (self.index as i64 + delta).clamp(0, self.entries.len() as i64 - 1) as usize;
        (target != self.index).then_some(target)
    }

    /// The entry at a given stack index.
    pub fn entry_at(&self, index: usize) -> &NavigationEntry {
        &self.entries[index]
    }

    /// Make the entry at `target` current and arm the echo marker (the
    /// layer is about to write the target fragment itself, and the poller
    /// will see that write).
    pub fn jump_to(&mut self, target: usize) -> NavigationEntry {
        self.startup = None;
        self.index = target;
        let entry = self.entries[target].clone();
        self.arm_echo(&entry);
        entry
    }

    /// Apply an explicit traversal under emulation.
    ///
    /// Moves the index by `delta`, clamped to the stack bounds. Returns
    /// the entry that became current, or `None` if the traversal was a
    /// no-op.
    pub fn apply_traverse(&mut self, delta: i64) -> Option<NavigationEntry> {
        self.peek_traverse(delta).map(|target| self.jump_to(target))
    }

    /// Classify one raw signal from the adapter.
    pub fn on_signal(&mut self, sig: &RawSignal) -> SignalOutcome {
        let startup = self.startup.take();

        // Load-time echo: the very first observed signal, matching the
        // address recorded at initialization, with no local navigation in
        // between.
        if let Some(initial) = startup {
            if initial == sig.address {
                return SignalOutcome::StartupEcho;
            }
        }

        // Resolve the signal to a state reference: host-supplied id, else
        // the most recent tracked entry at that address, else a synthetic
        // id derived from the address (user-typed fragment).
        let state_id = sig
            .state_id
            .or_else(|| {
                self.entries
                    .iter()
                    .rev()
                    .find(|e| e.address == sig.address)
                    .map(|e| e.state_id)
            })
            .unwrap_or_else(|| StateId::derive(&sig.address));

        // Echo of our own write reflecting back. Drain through the match:
        // older marks belong to writes the detector coalesced over.
        if let Some(pos) = self
            .awaiting_echo
            .iter()
            .position(|mark| mark.address == sig.address && mark.state_id == state_id)
        {
            self.awaiting_echo.drain(..=pos);
            return SignalOutcome::Echo;
        }

        // Already current: a stale or repeated observation, not a move.
        let current = self.current();
        if current.address == sig.address && current.state_id == state_id {
            return SignalOutcome::Duplicate;
        }

        // Genuine navigation: whatever reflections were still pending got
        // overtaken by it.
        self.awaiting_echo.clear();

        // A known position means back/forward recall; an unknown one is a
        // new external entry after the current position.
        if let Some(idx) = self
            .entries
            .iter()
            .rposition(|e| e.address == sig.address && e.state_id == state_id)
        {
            self.index = idx;
            SignalOutcome::Navigated {
                entry: self.entries[idx].clone(),
                pruned: Vec::new(),
            }
        } else {
            let pruned = self.truncate_forward();
            self.last_issued = self.last_issued.next();
            let entry = NavigationEntry::new(sig.address.clone(), state_id, None, self.last_issued);
            self.entries.push(entry.clone());
            self.index = self.entries.len() - 1;
            SignalOutcome::Navigated { entry, pruned }
        }
    }

    /// Restore a previously checkpointed stack (legacy mode).
    ///
    /// The current index snaps to the entry matching `current_address`
    /// when one exists, since the document was rebuilt at that address.
    pub fn restore(
        &mut self,
        entries: Vec<NavigationEntry>,
        index: usize,
        current_address: &Address,
    ) {
        if entries.is_empty() {
            return;
        }
        self.last_issued = entries
            .iter()
            .map(|e| e.seq)
            .max()
            .unwrap_or(self.last_issued)
            .max(self.last_issued);
        self.index = entries
            .iter()
            .rposition(|e| &e.address == current_address)
            .unwrap_or_else(|| index.min(entries.len() - 1));
        self.startup = Some(entries[self.index].address.clone());
        self.entries = entries;
    }

    fn arm_echo(&mut self, entry: &NavigationEntry) {
        if !self.observes_own_writes {
            return;
        }
        self.awaiting_echo.push_back(EchoMark {
            address: entry.address.clone(),
            state_id: entry.state_id,
        });
    }

    /// Drop every entry after the current index, returning the state ids
    /// that no surviving entry still references.
    fn truncate_forward(&mut self) -> Vec<StateId> {
        let removed = self.entries.split_off(self.index + 1);
        removed
            .into_iter()
            .map(|e| e.state_id)
            .filter(|id| !self.entries.iter().any(|e| e.state_id == *id))
            .collect()
    }
}
