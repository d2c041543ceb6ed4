//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// A failed write during push/replace is surfaced synchronously to the
/// caller; it is never deferred or silently dropped, since losing a state
/// write would desynchronize later back/forward recall.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Payload serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
