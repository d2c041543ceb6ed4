//! Raw signals: the normalized shape of a host-level change notification.

use crate::entry::Address;
use crate::types::StateId;

/// One host-level change notification, before deduplication.
///
/// Both detection mechanisms produce this shape. A native backend attaches
/// the state id it carried with the navigation; fragment polling never can,
/// so emulated signals always arrive with `state_id: None` and the state
/// store is consulted separately to recover the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSignal {
    /// The address the host reports as current.
    pub address: Address,
    /// Host-supplied state reference, when the backend can carry one.
    pub state_id: Option<StateId>,
}

impl RawSignal {
    /// A signal with host-supplied state (native backends).
    pub fn with_state(address: Address, state_id: StateId) -> Self {
        Self {
            address,
            state_id: Some(state_id),
        }
    }

    /// A bare address change (fragment polling, user-typed navigation).
    pub fn bare(address: Address) -> Self {
        Self {
            address,
            state_id: None,
        }
    }
}
