//! Error types for the navigation layer.

use thiserror::Error;

use wayline_core::CoreError;
use wayline_host::HostError;
use wayline_store::StoreError;

/// Errors surfaced by the Navigator.
///
/// Nothing here is fatal to the hosting document. A storage failure during
/// push/replace is returned synchronously to the caller and leaves the
/// layer at its prior entry; resolution failures on incoming signals are
/// recovered internally and never reach this type.
#[derive(Debug, Error)]
pub enum NavError {
    /// State store failure.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Host boundary failure.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Payload encoding/decoding failure.
    #[error("encoding error: {0}")]
    Encoding(#[from] CoreError),
}

/// Result type for Navigator operations.
pub type Result<T> = std::result::Result<T, NavError>;
