//! # rowsync protocol
//!
//! Wire types and codecs for the rowsync line protocol.
//!
//! This crate provides:
//! - The recognized table set ([`TableSet`])
//! - The batch model ([`Batch`], [`Row`])
//! - The batch decoder ([`BatchDecoder`])
//! - The watermark acknowledgment payload ([`CursorSnapshot`])
//!
//! # Protocol
//!
//! The wire format is newline-delimited JSON over a byte-stream
//! transport. A client line is either the disconnect sentinel
//! ([`DISCONNECT_SENTINEL`]) or a JSON object whose keys are recognized
//! table names and whose values are arrays of row objects. The server
//! replies to every non-sentinel line with a single JSON object mapping
//! every recognized table name to its cumulative committed-row count.
//!
//! Table names outside the recognized set are a protocol violation and
//! fail decoding; the decoder never mutates state and is safe to retry.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod batch;
mod decode;
mod error;
mod snapshot;
mod tables;

pub use batch::{AppliedCounts, Batch, Row};
pub use decode::BatchDecoder;
pub use error::{DecodeError, DecodeResult};
pub use snapshot::CursorSnapshot;
pub use tables::TableSet;

/// Literal line a client sends to end its session gracefully.
pub const DISCONNECT_SENTINEL: &str = "88";
