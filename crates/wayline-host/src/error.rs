//! Error types for the host module.

use thiserror::Error;

/// Errors that can occur at the host boundary.
#[derive(Debug, Error)]
pub enum HostError {
    /// The backend does not expose a required capability.
    ///
    /// Raised once during mode selection, never per call.
    #[error("host capability unavailable: {0}")]
    Unsupported(String),

    /// The signal channel to the host is gone.
    #[error("host signal channel detached")]
    Detached,

    /// The host rejected an address commit.
    #[error("address commit rejected: {0}")]
    CommitRejected(String),

    /// I/O error from an auxiliary persistence surface.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for host operations.
pub type Result<T> = std::result::Result<T, HostError>;
