//! Error types for the sync server.

use rowsync_protocol::DecodeError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// A wire payload failed to decode.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The row store rejected a batch.
    #[error("apply error: {0}")]
    Apply(#[from] ApplyError),

    /// Read or write failure on the connection or listener.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Persisted cursor state could not be written.
    #[error("state store error: {0}")]
    State(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Errors reported by a row store when applying a batch.
///
/// Apply failures are local to one batch: no watermark advancement
/// occurs for that batch and the session continues.
#[derive(Error, Debug)]
pub enum ApplyError {
    /// The store rejected the write (e.g. a constraint violation).
    #[error("row store rejected batch: {0}")]
    Rejected(String),

    /// The store is unreachable.
    #[error("row store unavailable: {0}")]
    Unavailable(String),

    /// I/O failure in a file-backed store.
    #[error("row store io error: {0}")]
    Io(#[from] std::io::Error),
}
