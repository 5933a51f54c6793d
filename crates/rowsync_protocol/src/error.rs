//! Error types for protocol decoding.

use thiserror::Error;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors produced while decoding a wire payload.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The payload is not well-formed for the expected shape.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The payload references a table outside the recognized set.
    #[error("unknown table: {0}")]
    UnknownTable(String),
}
