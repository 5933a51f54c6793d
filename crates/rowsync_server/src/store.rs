//! Row store abstraction.

use crate::error::ApplyError;
use rowsync_protocol::{AppliedCounts, Batch, Row};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The external backing store that durably writes rows.
///
/// One `apply` call is one logical write for the whole batch; the
/// store reports success or failure per batch, not per row. On success
/// it returns the number of rows each table contained, which the
/// session uses as the watermark delta — the design equates rows
/// submitted with rows committed, trusting the store's apply to be
/// all-or-nothing for the batch. Whether a retried batch is idempotent
/// is the store's contract, not guaranteed here.
pub trait RowStore {
    /// Applies a decoded batch as one logical write.
    fn apply(&mut self, batch: &Batch) -> Result<AppliedCounts, ApplyError>;
}

/// In-memory row store for tests and embedding.
///
/// Records every applied row and supports failure injection: after
/// [`MemoryRowStore::set_fail`], applies fail until the failure is
/// cleared, and nothing is recorded for the failed batches.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    rows: BTreeMap<String, Vec<Row>>,
    fail: Option<String>,
}

impl MemoryRowStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent applies fail with `message`.
    pub fn set_fail(&mut self, message: impl Into<String>) {
        self.fail = Some(message.into());
    }

    /// Clears an injected failure.
    pub fn clear_fail(&mut self) {
        self.fail = None;
    }

    /// Returns the rows applied so far for `table`.
    pub fn rows(&self, table: &str) -> &[Row] {
        self.rows.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the total number of rows applied across all tables.
    pub fn total_rows(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }
}

impl RowStore for MemoryRowStore {
    fn apply(&mut self, batch: &Batch) -> Result<AppliedCounts, ApplyError> {
        if let Some(message) = &self.fail {
            return Err(ApplyError::Rejected(message.clone()));
        }
        for (table, rows) in batch.tables() {
            self.rows
                .entry(table.to_string())
                .or_default()
                .extend(rows.iter().cloned());
        }
        Ok(batch.row_counts())
    }
}

/// File-backed row store: appends each row as one JSON line to
/// `<dir>/<table>.jsonl`, flushing once per batch.
///
/// A stand-in for the production database behind the same trait. The
/// single-writer design means no cross-process coordination; the
/// all-or-nothing contract holds only as far as the filesystem's
/// append semantics do.
#[derive(Debug)]
pub struct JsonlRowStore {
    dir: PathBuf,
}

impl JsonlRowStore {
    /// Creates the store, making `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ApplyError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Returns the directory holding the table files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RowStore for JsonlRowStore {
    fn apply(&mut self, batch: &Batch) -> Result<AppliedCounts, ApplyError> {
        for (table, rows) in batch.tables() {
            if rows.is_empty() {
                continue;
            }
            let path = self.dir.join(format!("{table}.jsonl"));
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            for row in rows {
                let line = serde_json::Value::Object(row.clone()).to_string();
                writeln!(file, "{line}")?;
            }
            file.flush()?;
            debug!(table = %table, rows = rows.len(), "appended rows");
        }
        Ok(batch.row_counts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), serde_json::Value::from(id));
        row
    }

    fn batch() -> Batch {
        let mut batch = Batch::new();
        batch.insert("Orders", vec![row(1), row(2)]);
        batch.insert("Customers", vec![]);
        batch
    }

    #[test]
    fn memory_store_counts_and_records() {
        let mut store = MemoryRowStore::new();
        let counts = store.apply(&batch()).unwrap();

        assert_eq!(counts.get("Orders"), Some(&2));
        assert_eq!(counts.get("Customers"), Some(&0));
        assert_eq!(store.rows("Orders").len(), 2);
        assert_eq!(store.total_rows(), 2);
    }

    #[test]
    fn memory_store_failure_injection() {
        let mut store = MemoryRowStore::new();
        store.set_fail("connection lost");

        let err = store.apply(&batch()).unwrap_err();
        assert!(matches!(err, ApplyError::Rejected(_)));
        assert_eq!(store.total_rows(), 0);

        store.clear_fail();
        assert!(store.apply(&batch()).is_ok());
    }

    #[test]
    fn jsonl_store_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonlRowStore::new(dir.path()).unwrap();

        let counts = store.apply(&batch()).unwrap();
        assert_eq!(counts.get("Orders"), Some(&2));

        let content = std::fs::read_to_string(dir.path().join("Orders.jsonl")).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().next().unwrap().contains("\"id\":1"));

        // Zero-row tables get no file.
        assert!(!dir.path().join("Customers.jsonl").exists());
    }

    #[test]
    fn jsonl_store_accumulates_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonlRowStore::new(dir.path()).unwrap();

        store.apply(&batch()).unwrap();
        store.apply(&batch()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("Orders.jsonl")).unwrap();
        assert_eq!(content.lines().count(), 4);
    }
}
