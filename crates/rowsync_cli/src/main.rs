//! rowsync CLI
//!
//! Command-line tools for the rowsync server.
//!
//! # Commands
//!
//! - `serve` - Run the sync server
//! - `watermarks` - Print persisted per-table cursor state

use clap::{Parser, Subcommand};
use rowsync_server::{
    JsonlRowStore, ServerConfig, SyncServer, TomlStateStore, LAST_ID_SECTION,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// rowsync command-line tools.
#[derive(Parser)]
#[command(name = "rowsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync server
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Recognized table names (overrides the config file)
        #[arg(short, long)]
        tables: Vec<String>,

        /// Persisted cursor state file (overrides the config file)
        #[arg(long)]
        state: Option<PathBuf>,

        /// Row store directory (overrides the config file)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Print persisted per-table cursor state
    Watermarks {
        /// Persisted cursor state file (overrides the config file)
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    match cli.command {
        Commands::Serve {
            listen,
            tables,
            state,
            data_dir,
        } => {
            if let Some(listen) = listen {
                config.bind_addr = listen;
            }
            if !tables.is_empty() {
                config.tables = tables;
            }
            if let Some(state) = state {
                config.state_path = state;
            }
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }
            if config.tables.is_empty() {
                return Err("at least one table must be configured".into());
            }

            let state = TomlStateStore::open(&config.state_path);
            let store = JsonlRowStore::new(&config.data_dir)?;
            let mut server = SyncServer::new(config, store, state);
            server.run()?;
        }
        Commands::Watermarks { state } => {
            let path = state.unwrap_or(config.state_path);
            let store = TomlStateStore::open(&path);
            let mut entries = store.entries(LAST_ID_SECTION).peekable();
            if entries.peek().is_none() {
                println!("no persisted watermarks at {}", path.display());
            }
            for (table, count) in entries {
                println!("{table}: {count}");
            }
        }
    }

    Ok(())
}
