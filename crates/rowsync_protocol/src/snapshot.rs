//! Watermark snapshot payload.

use crate::error::{DecodeError, DecodeResult};
use std::collections::BTreeMap;

/// A read-only copy of the per-table committed-row counts.
///
/// Doubles as the acknowledgment payload (one JSON object per reply,
/// always carrying every recognized table) and as the image written to
/// persisted storage. The full set, not just the last batch's delta, is
/// sent on every acknowledgment so a client reconnecting after a
/// partial failure can resynchronize from a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorSnapshot {
    counts: BTreeMap<String, u64>,
}

impl CursorSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the count for `table`, or 0 if absent.
    pub fn get(&self, table: &str) -> u64 {
        self.counts.get(table).copied().unwrap_or(0)
    }

    /// Sets the count for `table`.
    pub fn set(&mut self, table: impl Into<String>, count: u64) {
        self.counts.insert(table.into(), count);
    }

    /// Iterates (table name, count) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Returns the number of tables in the snapshot.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if the snapshot holds no tables.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Encodes the snapshot as one JSON object, the acknowledgment
    /// wire form. The caller appends the line terminator.
    pub fn encode(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .counts
            .iter()
            .map(|(name, count)| (name.clone(), serde_json::Value::from(*count)))
            .collect();
        serde_json::Value::Object(map).to_string()
    }

    /// Decodes an acknowledgment line back into a snapshot.
    ///
    /// Used by clients and tests; the server only encodes.
    pub fn decode(payload: &str) -> DecodeResult<Self> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| DecodeError::Malformed("acknowledgment must be an object".into()))?;

        let mut counts = BTreeMap::new();
        for (name, count) in object {
            let count = count.as_u64().ok_or_else(|| {
                DecodeError::Malformed(format!("count for `{name}` must be a non-negative integer"))
            })?;
            counts.insert(name.clone(), count);
        }
        Ok(Self { counts })
    }
}

impl FromIterator<(String, u64)> for CursorSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_defaults_to_zero() {
        let snapshot = CursorSnapshot::new();
        assert_eq!(snapshot.get("Orders"), 0);
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut snapshot = CursorSnapshot::new();
        snapshot.set("Orders", 8);
        snapshot.set("Customers", 2);

        let line = snapshot.encode();
        let decoded = CursorSnapshot::decode(&line).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn encode_is_flat_json_object() {
        let mut snapshot = CursorSnapshot::new();
        snapshot.set("Orders", 8);
        snapshot.set("Customers", 2);

        // BTreeMap ordering makes the wire form deterministic.
        assert_eq!(snapshot.encode(), r#"{"Customers":2,"Orders":8}"#);
    }

    #[test]
    fn decode_rejects_negative_count() {
        let err = CursorSnapshot::decode(r#"{"Orders":-1}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn decode_rejects_non_object() {
        let err = CursorSnapshot::decode("[1,2]").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn from_iterator() {
        let snapshot: CursorSnapshot =
            [("Orders".to_string(), 5), ("Customers".to_string(), 2)]
                .into_iter()
                .collect();
        assert_eq!(snapshot.get("Orders"), 5);
        assert_eq!(snapshot.len(), 2);
    }
}
