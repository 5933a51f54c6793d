//! Server configuration.

use crate::error::{ServerError, ServerResult};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Recognized table names, shared by decoder, registry, and store.
    pub tables: Vec<String>,
    /// Path of the persisted cursor state file.
    pub state_path: PathBuf,
    /// Directory for the file-backed row store.
    pub data_dir: PathBuf,
}

impl ServerConfig {
    /// Creates a configuration listening on `bind_addr`.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            tables: Vec::new(),
            state_path: PathBuf::from("cursors.toml"),
            data_dir: PathBuf::from("rows"),
        }
    }

    /// Sets the recognized table names.
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the persisted cursor state path.
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    /// Sets the row store directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Loads configuration from a TOML file.
    ///
    /// Absent entries keep their defaults; at least one table must be
    /// configured before the server can start, but that is checked at
    /// construction, not here.
    pub fn from_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let raw: RawConfig = toml::from_str(&content).map_err(|e| {
            ServerError::Config(format!("cannot parse {}: {e}", path.display()))
        })?;

        let mut config = ServerConfig::default();
        if let Some(listen) = raw.listen {
            config.bind_addr = listen.parse().map_err(|e| {
                ServerError::Config(format!("invalid listen address `{listen}`: {e}"))
            })?;
        }
        if let Some(tables) = raw.tables {
            config.tables = tables;
        }
        if let Some(state_path) = raw.state_path {
            config.state_path = state_path;
        }
        if let Some(data_dir) = raw.data_dir {
            config.data_dir = data_dir;
        }
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], 54321)))
    }
}

/// On-disk configuration shape; every entry optional.
#[derive(Debug, Deserialize)]
struct RawConfig {
    listen: Option<String>,
    tables: Option<Vec<String>>,
    state_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}
