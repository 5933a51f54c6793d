//! # rowsync server
//!
//! Single-session incremental row-synchronization server.
//!
//! This crate provides:
//! - The cursor registry (per-table committed-row watermarks)
//! - Persisted state store abstraction (TOML file or in-memory)
//! - Row store abstraction (the external backing database)
//! - Line-oriented connection transport (TCP or scripted in-memory)
//! - The session protocol state machine
//! - The single-session TCP listener
//!
//! # Architecture
//!
//! One client at a time holds a persistent connection and streams
//! newline-delimited JSON batches of rows grouped by table. Each batch
//! is decoded, applied to the row store as one logical write, and
//! acknowledged with the full set of per-table cumulative committed-row
//! counts. The client uses those watermarks to know what it may safely
//! discard and to detect gaps after a crash.
//!
//! The listener fully drains one connection before accepting the next.
//! This is a deliberate design choice: it removes all locking around
//! the cursor registry and the row store handle, at the cost of
//! serializing clients. Batches within a session are processed strictly
//! in order; the acknowledgment for batch N is written before batch
//! N+1 is read.
//!
//! # Failure model
//!
//! Decode and apply failures are local to one batch: no watermark moves
//! and the session continues, acknowledging the unchanged snapshot so
//! the client can detect that its batch did not land. Transport
//! failures terminate the session after flushing the registry from its
//! last known-good state. Watermarks are persisted on every
//! client-initiated disconnect and on graceful shutdown.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod registry;
mod server;
mod session;
mod state;
mod store;
mod transport;

pub use config::ServerConfig;
pub use error::{ApplyError, ServerError, ServerResult};
pub use registry::CursorRegistry;
pub use server::SyncServer;
pub use session::{SessionHandler, SessionState};
pub use state::{MemoryStateStore, StateStore, TomlStateStore, LAST_ID_SECTION};
pub use store::{JsonlRowStore, MemoryRowStore, RowStore};
pub use transport::{Connection, ScriptedConnection, TcpConnection};
