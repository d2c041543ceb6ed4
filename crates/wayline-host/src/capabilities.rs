//! Capability probing and one-shot backend mode selection.

use std::fmt;

/// What the host environment exposes, probed once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// The host can set an address with attached opaque state and pushes
    /// position-change notifications itself.
    pub native_state: bool,
    /// A key/value persistence surface surviving a full reload exists.
    pub durable_storage: bool,
    /// The host can hint visibility/focus changes, usable to wake the
    /// fragment poller early.
    pub visibility_hints: bool,
    /// The host's change notification also fires for commits the caller
    /// itself made. Such reflections must be suppressed downstream.
    pub echoes_commits: bool,
}

impl Capabilities {
    /// Everything available: native state manipulation plus durable storage.
    pub const fn full() -> Self {
        Self {
            native_state: true,
            durable_storage: true,
            visibility_hints: true,
            echoes_commits: false,
        }
    }

    /// Fragment watching only, with durable storage.
    pub const fn fragment_only() -> Self {
        Self {
            native_state: false,
            durable_storage: true,
            visibility_hints: false,
            echoes_commits: false,
        }
    }

    /// Neither native notifications nor durable storage.
    pub const fn bare() -> Self {
        Self {
            native_state: false,
            durable_storage: false,
            visibility_hints: false,
            echoes_commits: false,
        }
    }
}

/// The operating mode of the layer, selected once at startup.
///
/// A missing backend is not a runtime error: it causes a permanent mode
/// selection here and is never re-evaluated per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// The host delivers position-change notifications with attached state.
    Native,
    /// No native notifications; the layer watches the address fragment and
    /// keeps payloads in durable storage.
    Emulated,
    /// Neither native notifications nor durable storage; fragment watching
    /// plus an auxiliary frame persistence surface.
    Legacy,
}

impl BackendMode {
    /// Select the mode for a probed capability set.
    pub fn select(caps: &Capabilities) -> Self {
        if caps.native_state {
            BackendMode::Native
        } else if caps.durable_storage {
            BackendMode::Emulated
        } else {
            BackendMode::Legacy
        }
    }

    /// Whether the layer must track history depth itself.
    ///
    /// Under a native backend the host owns the stack; under emulation the
    /// layer's own entry list is authoritative.
    pub fn tracks_own_stack(&self) -> bool {
        !matches!(self, BackendMode::Native)
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Native => write!(f, "native"),
            BackendMode::Emulated => write!(f, "emulated"),
            BackendMode::Legacy => write!(f, "legacy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selection() {
        assert_eq!(BackendMode::select(&Capabilities::full()), BackendMode::Native);
        assert_eq!(
            BackendMode::select(&Capabilities::fragment_only()),
            BackendMode::Emulated
        );
        assert_eq!(BackendMode::select(&Capabilities::bare()), BackendMode::Legacy);
    }

    #[test]
    fn test_native_wins_even_without_storage() {
        let caps = Capabilities {
            native_state: true,
            durable_storage: false,
            visibility_hints: false,
            echoes_commits: false,
        };
        assert_eq!(BackendMode::select(&caps), BackendMode::Native);
    }

    #[test]
    fn test_stack_ownership() {
        assert!(!BackendMode::Native.tracks_own_stack());
        assert!(BackendMode::Emulated.tracks_own_stack());
        assert!(BackendMode::Legacy.tracks_own_stack());
    }
}
