//! The sync server.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::registry::CursorRegistry;
use crate::session::SessionHandler;
use crate::state::StateStore;
use crate::store::RowStore;
use crate::transport::{Connection, TcpConnection};
use rowsync_protocol::{BatchDecoder, CursorSnapshot, TableSet};
use std::net::TcpListener;
use tracing::{info, warn};

/// The sync server.
///
/// Owns the cursor registry, the row store, and the persisted state
/// store, and drives one session at a time over them. The accept loop
/// fully drains each connection before taking the next, so nothing
/// here needs synchronization.
///
/// # Example
///
/// ```
/// use rowsync_server::{MemoryRowStore, MemoryStateStore, ServerConfig, SyncServer};
///
/// let config = ServerConfig::default().with_tables(["Orders", "Customers"]);
/// let server = SyncServer::new(config, MemoryRowStore::new(), MemoryStateStore::new());
/// assert_eq!(server.watermarks().get("Orders"), 0);
/// // server.run() binds the listener and serves clients until failure.
/// ```
pub struct SyncServer<S: RowStore, P: StateStore> {
    config: ServerConfig,
    decoder: BatchDecoder,
    registry: CursorRegistry,
    store: S,
    state: P,
}

impl<S: RowStore, P: StateStore> SyncServer<S, P> {
    /// Creates a server, loading the registry from persisted state.
    pub fn new(config: ServerConfig, store: S, state: P) -> Self {
        let tables = TableSet::new(config.tables.iter().cloned());
        let registry = CursorRegistry::load(&state, &tables);
        let decoder = BatchDecoder::new(tables);
        Self {
            config,
            decoder,
            registry,
            store,
            state,
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the current watermark snapshot.
    pub fn watermarks(&self) -> CursorSnapshot {
        self.registry.snapshot()
    }

    /// Runs one session over an accepted connection to completion.
    ///
    /// Public seam for embedding and tests; [`SyncServer::run`] calls
    /// this for every accepted TCP client.
    pub fn serve_connection<C: Connection>(&mut self, connection: C) -> ServerResult<()> {
        let mut session = SessionHandler::new(
            connection,
            &self.decoder,
            &mut self.registry,
            &mut self.store,
            &mut self.state,
        );
        session.run()
    }

    /// Binds the listener and serves clients, one connection at a time,
    /// until the listener fails.
    ///
    /// A session that ends in a transport error is logged and the loop
    /// continues with the next client; the registry has already been
    /// flushed by the session.
    pub fn run(&mut self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr)?;
        info!(addr = %self.config.bind_addr, "server started");

        loop {
            info!("waiting for a connection");
            let (stream, peer) = listener.accept()?;
            info!(peer = %peer, "accepted client");

            let connection = match TcpConnection::new(stream) {
                Ok(connection) => connection,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "failed to set up connection");
                    continue;
                }
            };
            if let Err(e) = self.serve_connection(connection) {
                warn!(peer = %peer, error = %e, "session ended with error");
            }
        }
    }

    /// Flushes cursors for graceful shutdown.
    pub fn shutdown(&mut self) -> ServerResult<()> {
        info!("now closing");
        self.registry.flush(&mut self.state)
    }
}
