//! Batch decoding.

use crate::batch::{Batch, Row};
use crate::error::{DecodeError, DecodeResult};
use crate::tables::TableSet;

/// Decodes wire payloads into [`Batch`] values.
///
/// Decoding is a pure function: it never mutates external state and is
/// safe to retry. A payload that is not a JSON object of
/// `table name -> array of row objects`, or that names a table outside
/// the recognized set, fails with [`DecodeError`] and produces no batch.
#[derive(Debug, Clone)]
pub struct BatchDecoder {
    tables: TableSet,
}

impl BatchDecoder {
    /// Creates a decoder validating against the given table set.
    pub fn new(tables: TableSet) -> Self {
        Self { tables }
    }

    /// Returns the recognized table set.
    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    /// Decodes one wire line into a batch.
    pub fn decode(&self, payload: &str) -> DecodeResult<Batch> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| DecodeError::Malformed("batch payload must be an object".into()))?;

        let mut batch = Batch::new();
        for (name, rows_value) in object {
            if !self.tables.contains(name) {
                return Err(DecodeError::UnknownTable(name.clone()));
            }

            let rows_array = rows_value.as_array().ok_or_else(|| {
                DecodeError::Malformed(format!("table `{name}` must map to an array of rows"))
            })?;

            let mut rows: Vec<Row> = Vec::with_capacity(rows_array.len());
            for row_value in rows_array {
                let row = row_value.as_object().ok_or_else(|| {
                    DecodeError::Malformed(format!("table `{name}` contains a non-object row"))
                })?;
                rows.push(row.clone());
            }
            batch.insert(name.clone(), rows);
        }

        Ok(batch)
    }
}
