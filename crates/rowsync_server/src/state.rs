//! Persisted state store.
//!
//! The cursor registry reads and writes its watermarks through the
//! [`StateStore`] abstraction: integer entries grouped into named
//! sections. Any durable key-value store suffices; the file-backed
//! implementation here uses a TOML document with one table per section.

use crate::error::{ServerError, ServerResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Section holding the per-table committed-row counts.
pub const LAST_ID_SECTION: &str = "LastID";

/// A durable store of integer entries grouped into named sections.
///
/// Reads never fail: a missing section or key yields the caller's
/// default. Writes mutate an in-memory image; [`StateStore::persist`]
/// makes the image durable.
pub trait StateStore {
    /// Reads the integer at `section`/`key`, or `default` if absent.
    fn read_int(&self, section: &str, key: &str, default: i64) -> i64;

    /// Sets the integer at `section`/`key`.
    fn write_int(&mut self, section: &str, key: &str, value: i64);

    /// Flushes the in-memory image to durable storage.
    fn persist(&mut self) -> ServerResult<()>;
}

type Sections = BTreeMap<String, BTreeMap<String, i64>>;

/// File-backed state store: a TOML document, one table per section.
#[derive(Debug)]
pub struct TomlStateStore {
    path: PathBuf,
    sections: Sections,
}

impl TomlStateStore {
    /// Opens the store at `path`.
    ///
    /// Never fails: a missing file starts empty, and an unreadable or
    /// unparsable file is logged as a degraded start and also starts
    /// empty. Favors availability over strict correctness.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let sections = match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Sections>(&content) {
                Ok(sections) => sections,
                Err(e) => {
                    warn!(path = %path.display(), error = %e,
                        "persisted state is unparsable, starting with empty cursors");
                    Sections::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no persisted state, starting fresh");
                Sections::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e,
                    "persisted state is unreadable, starting with empty cursors");
                Sections::new()
            }
        };
        Self { path, sections }
    }

    /// Returns the path backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterates the entries of `section` in key order.
    pub fn entries(&self, section: &str) -> impl Iterator<Item = (&str, i64)> {
        self.sections
            .get(section)
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(key, value)| (key.as_str(), *value)))
    }
}

impl StateStore for TomlStateStore {
    fn read_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .copied()
            .unwrap_or(default)
    }

    fn write_int(&mut self, section: &str, key: &str, value: i64) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn persist(&mut self) -> ServerResult<()> {
        let content = toml::to_string_pretty(&self.sections)
            .map_err(|e| ServerError::State(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| ServerError::State(e.to_string()))?;
        debug!(path = %self.path.display(), "persisted state written");
        Ok(())
    }
}

/// In-memory state store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    sections: Sections,
}

impl MemoryStateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn read_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .copied()
            .unwrap_or(default)
    }

    fn write_int(&mut self, section: &str, key: &str, value: i64) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn persist(&mut self) -> ServerResult<()> {
        Ok(())
    }
}
