//! The batch model.

use std::collections::BTreeMap;

/// One row record: an opaque mapping of column name to value.
///
/// The core never inspects columns; rows pass through to the row store
/// exactly as received.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Per-table row counts reported by a row store apply.
///
/// Contains an entry for each table present in the applied batch. Used
/// as the watermark delta: the design equates rows submitted in a batch
/// with rows committed, trusting the store's apply to be all-or-nothing
/// per batch.
pub type AppliedCounts = BTreeMap<String, u64>;

/// One client-submitted unit of work: an ordered mapping from table
/// name to an ordered sequence of rows.
///
/// Table order and row order match the wire payload. Every table name
/// in a decoded batch is a member of the recognized table set; the
/// decoder rejects anything else before a `Batch` exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    entries: Vec<(String, Vec<Row>)>,
}

impl Batch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table and its rows, preserving submission order.
    pub fn insert(&mut self, table: impl Into<String>, rows: Vec<Row>) {
        self.entries.push((table.into(), rows));
    }

    /// Iterates (table name, rows) entries in submission order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.entries
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// Returns the rows for `table`, if present in this batch.
    pub fn rows(&self, table: &str) -> Option<&[Row]> {
        self.entries
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, rows)| rows.as_slice())
    }

    /// Returns the number of tables present in this batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the batch contains no tables.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the total number of rows across all tables.
    pub fn total_rows(&self) -> u64 {
        self.entries.iter().map(|(_, rows)| rows.len() as u64).sum()
    }

    /// Returns the per-table row counts for this batch.
    pub fn row_counts(&self) -> AppliedCounts {
        self.entries
            .iter()
            .map(|(name, rows)| (name.clone(), rows.len() as u64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, value: i64) -> Row {
        let mut row = Row::new();
        row.insert(key.into(), serde_json::Value::from(value));
        row
    }

    #[test]
    fn empty_batch() {
        let batch = Batch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.total_rows(), 0);
        assert!(batch.row_counts().is_empty());
    }

    #[test]
    fn insertion_order_preserved() {
        let mut batch = Batch::new();
        batch.insert("Orders", vec![row("id", 1), row("id", 2)]);
        batch.insert("Customers", vec![row("id", 7)]);

        let names: Vec<_> = batch.tables().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Orders", "Customers"]);
        assert_eq!(batch.total_rows(), 3);
    }

    #[test]
    fn row_counts_per_table() {
        let mut batch = Batch::new();
        batch.insert("Orders", vec![row("id", 1), row("id", 2), row("id", 3)]);
        batch.insert("Customers", vec![]);

        let counts = batch.row_counts();
        assert_eq!(counts.get("Orders"), Some(&3));
        assert_eq!(counts.get("Customers"), Some(&0));
        assert_eq!(counts.get("Invoices"), None);
    }

    #[test]
    fn rows_lookup() {
        let mut batch = Batch::new();
        batch.insert("Orders", vec![row("id", 1)]);

        assert_eq!(batch.rows("Orders").map(<[Row]>::len), Some(1));
        assert!(batch.rows("Customers").is_none());
    }
}
