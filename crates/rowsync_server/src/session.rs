//! Session protocol state machine.

use crate::error::ServerResult;
use crate::registry::CursorRegistry;
use crate::state::StateStore;
use crate::store::RowStore;
use crate::transport::Connection;
use rowsync_protocol::{BatchDecoder, DISCONNECT_SENTINEL};
use tracing::{debug, error, info, warn};

/// The states a session moves through.
///
/// `Idle → AwaitingLine → Processing → Acknowledging → AwaitingLine`
/// until the disconnect sentinel, EOF, or a transport failure ends the
/// session in `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Entered on connection accept.
    Idle,
    /// Blocking on the next client line.
    AwaitingLine,
    /// Decoding and applying a batch payload.
    Processing,
    /// Writing the watermark snapshot back to the client.
    Acknowledging,
    /// Terminal; the connection transport is released.
    Closed,
}

impl SessionState {
    /// Returns true unless the session has terminated.
    pub fn is_open(&self) -> bool {
        !matches!(self, SessionState::Closed)
    }
}

/// Drives one client connection through the protocol.
///
/// The session owns the connection for its lifetime and borrows the
/// cursor registry, row store, and state store exclusively — the
/// single-session design means nothing else touches them while the
/// session runs. Each non-empty, non-sentinel line is decoded, applied,
/// and acknowledged with the full registry snapshot before the next
/// line is read.
pub struct SessionHandler<'a, C, S, P>
where
    C: Connection,
    S: RowStore,
    P: StateStore,
{
    connection: C,
    decoder: &'a BatchDecoder,
    registry: &'a mut CursorRegistry,
    store: &'a mut S,
    state_store: &'a mut P,
    state: SessionState,
}

impl<'a, C, S, P> SessionHandler<'a, C, S, P>
where
    C: Connection,
    S: RowStore,
    P: StateStore,
{
    /// Creates a session for an accepted connection.
    pub fn new(
        connection: C,
        decoder: &'a BatchDecoder,
        registry: &'a mut CursorRegistry,
        store: &'a mut S,
        state_store: &'a mut P,
    ) -> Self {
        Self {
            connection,
            decoder,
            registry,
            store,
            state_store,
            state: SessionState::Idle,
        }
    }

    /// Returns the current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session to completion.
    ///
    /// Returns `Ok` after a client-initiated disconnect (sentinel or
    /// EOF) and `Err` when the transport fails; either way the registry
    /// has been flushed to the state store from its last known-good
    /// state before this returns.
    pub fn run(&mut self) -> ServerResult<()> {
        self.state = SessionState::AwaitingLine;
        loop {
            let line = match self.connection.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("client closed the stream");
                    return self.close();
                }
                Err(e) => {
                    warn!(error = %e, "read failed, closing session");
                    self.abort();
                    return Err(e.into());
                }
            };

            if line == DISCONNECT_SENTINEL {
                info!("client requested disconnect");
                return self.close();
            }
            if line.is_empty() {
                // keepalive
                continue;
            }

            self.state = SessionState::Processing;
            self.process(&line);

            self.state = SessionState::Acknowledging;
            let ack = self.registry.snapshot().encode();
            if let Err(e) = self.connection.write_line(&ack) {
                warn!(error = %e, "acknowledgment write failed, closing session");
                self.abort();
                return Err(e.into());
            }
            debug!("acknowledgment sent");
            self.state = SessionState::AwaitingLine;
        }
    }

    /// Decodes and applies one batch payload, advancing watermarks on
    /// success. Decode and apply failures are local to the batch: they
    /// leave every watermark untouched and the session continues, so
    /// the client sees the unchanged snapshot and knows its batch did
    /// not land.
    fn process(&mut self, payload: &str) {
        debug!(bytes = payload.len(), "received batch payload");

        let batch = match self.decoder.decode(payload) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "rejected batch payload");
                return;
            }
        };

        let counts = match self.store.apply(&batch) {
            Ok(counts) => counts,
            Err(e) => {
                warn!(error = %e, "row store refused batch");
                return;
            }
        };

        for (table, rows) in &counts {
            self.registry.advance(table, *rows);
            if *rows > 0 {
                info!(table = %table, rows = *rows, "committed rows");
            }
        }
    }

    /// Clean close: flush cursors, then terminate.
    fn close(&mut self) -> ServerResult<()> {
        let flushed = self.registry.flush(self.state_store);
        self.state = SessionState::Closed;
        flushed
    }

    /// Transport-failure close: flush best-effort, keep the transport
    /// error as the session's result.
    fn abort(&mut self) {
        if let Err(e) = self.registry.flush(self.state_store) {
            error!(error = %e, "failed to persist cursors while closing");
        }
        self.state = SessionState::Closed;
    }
}
