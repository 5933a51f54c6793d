//! Cursor registry.

use crate::error::ServerResult;
use crate::state::{StateStore, LAST_ID_SECTION};
use rowsync_protocol::{CursorSnapshot, TableSet};
use std::collections::BTreeMap;

/// Per-table committed-row watermarks.
///
/// Holds one monotonically non-decreasing count per recognized table.
/// Constructed once at process startup from persisted state, mutated
/// only by the session handler after a successful apply, and flushed
/// back on every client-initiated disconnect and on graceful shutdown.
///
/// Not safe for concurrent callers: the single-session design gives the
/// active session exclusive ownership, so no synchronization exists
/// here. A multi-session upgrade would need `advance`/`snapshot` made
/// atomic per table.
#[derive(Debug)]
pub struct CursorRegistry {
    counts: BTreeMap<String, u64>,
}

impl CursorRegistry {
    /// Loads the registry from persisted state.
    ///
    /// Every recognized table gets an entry; a table missing from
    /// persisted storage defaults to 0. Never fails.
    pub fn load(store: &dyn StateStore, tables: &TableSet) -> Self {
        let counts = tables
            .iter()
            .map(|table| {
                let count = store.read_int(LAST_ID_SECTION, table, 0).max(0) as u64;
                (table.to_string(), count)
            })
            .collect();
        Self { counts }
    }

    /// Advances the count for `table` by `delta`.
    ///
    /// A delta of 0 is a no-op, not an error. Tables outside the
    /// recognized set are ignored; the decoder rejects them before a
    /// batch reaches this point.
    pub fn advance(&mut self, table: &str, delta: u64) {
        if delta == 0 {
            return;
        }
        if let Some(count) = self.counts.get_mut(table) {
            *count += delta;
        }
    }

    /// Returns the count for `table`, or 0 for unrecognized names.
    pub fn count(&self, table: &str) -> u64 {
        self.counts.get(table).copied().unwrap_or(0)
    }

    /// Returns a read-only copy of the full registry state.
    ///
    /// Used both as the acknowledgment payload and as the persistence
    /// image.
    pub fn snapshot(&self) -> CursorSnapshot {
        self.counts
            .iter()
            .map(|(table, count)| (table.clone(), *count))
            .collect()
    }

    /// Writes the snapshot to the `LastID` section and persists it.
    ///
    /// Must run before the registry is discarded, or watermark progress
    /// already acknowledged to a client is lost.
    pub fn flush(&self, store: &mut dyn StateStore) -> ServerResult<()> {
        for (table, count) in &self.counts {
            store.write_int(LAST_ID_SECTION, table, *count as i64);
        }
        store.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStateStore;

    fn tables() -> TableSet {
        TableSet::new(["Orders", "Customers"])
    }

    #[test]
    fn load_defaults_missing_tables_to_zero() {
        let mut store = MemoryStateStore::new();
        store.write_int(LAST_ID_SECTION, "Orders", 5);

        let registry = CursorRegistry::load(&store, &tables());
        assert_eq!(registry.count("Orders"), 5);
        assert_eq!(registry.count("Customers"), 0);
    }

    #[test]
    fn load_clamps_negative_counts() {
        let mut store = MemoryStateStore::new();
        store.write_int(LAST_ID_SECTION, "Orders", -3);

        let registry = CursorRegistry::load(&store, &tables());
        assert_eq!(registry.count("Orders"), 0);
    }

    #[test]
    fn advance_accumulates() {
        let store = MemoryStateStore::new();
        let mut registry = CursorRegistry::load(&store, &tables());

        registry.advance("Orders", 3);
        registry.advance("Orders", 2);
        assert_eq!(registry.count("Orders"), 5);
        assert_eq!(registry.count("Customers"), 0);
    }

    #[test]
    fn advance_zero_is_noop() {
        let store = MemoryStateStore::new();
        let mut registry = CursorRegistry::load(&store, &tables());

        registry.advance("Orders", 0);
        assert_eq!(registry.count("Orders"), 0);
    }

    #[test]
    fn advance_unrecognized_table_ignored() {
        let store = MemoryStateStore::new();
        let mut registry = CursorRegistry::load(&store, &tables());

        registry.advance("Invoices", 7);
        assert_eq!(registry.count("Invoices"), 0);
        assert_eq!(registry.snapshot().len(), 2);
    }

    #[test]
    fn snapshot_covers_every_table() {
        let store = MemoryStateStore::new();
        let mut registry = CursorRegistry::load(&store, &tables());
        registry.advance("Orders", 3);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.get("Orders"), 3);
        assert_eq!(snapshot.get("Customers"), 0);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn monotone_across_flush_and_reload() {
        let mut store = MemoryStateStore::new();
        let mut registry = CursorRegistry::load(&store, &tables());
        registry.advance("Orders", 8);
        registry.advance("Customers", 2);
        registry.flush(&mut store).unwrap();

        let reloaded = CursorRegistry::load(&store, &tables());
        assert_eq!(reloaded.snapshot(), registry.snapshot());

        // A second cycle never decreases any count.
        let mut registry = reloaded;
        registry.advance("Orders", 1);
        registry.flush(&mut store).unwrap();
        let reloaded = CursorRegistry::load(&store, &tables());
        assert_eq!(reloaded.count("Orders"), 9);
        assert_eq!(reloaded.count("Customers"), 2);
    }
}
