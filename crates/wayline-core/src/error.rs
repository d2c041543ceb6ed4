//! Error types for the Wayline core.

use thiserror::Error;

/// Core errors that can occur during payload and identifier handling.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("invalid state id: {0}")]
    InvalidStateId(#[from] hex::FromHexError),
}
