//! Row transformation: maps source rows into a target schema using the
//! resolved column bindings.
//!
//! Exactly one output row is produced per input row; unmatched fields take
//! the schema's declared fallback so no output cell is ever missing.

use crate::error::BundleError;
use crate::ingest::RawTable;
use crate::resolve::ColumnBinding;
use crate::schema::{Fallback, SchemaSpec};

/// A fully-populated output table in schema field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTable {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl OutputTable {
    /// Header-only table for a missing or unreadable category.
    pub fn empty(spec: &SchemaSpec) -> Self {
        Self {
            fields: spec.field_names(),
            rows: Vec::new(),
        }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Serializes the table to UTF-8 CSV with the header row first.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, BundleError> {
        let mut buf = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            writer.write_record(self.fields.iter())?;
            for row in &self.rows {
                writer.write_record(row.iter())?;
            }
            writer.flush().map_err(BundleError::from)?;
        }
        Ok(buf)
    }
}

/// Applies `bindings` to every row of `raw`. Matched fields copy the cell
/// verbatim (trimmed); unmatched fields take their fallback. Malformed or
/// short rows flow through as empty strings.
pub fn transform(raw: &RawTable, bindings: &[ColumnBinding], spec: &SchemaSpec) -> OutputTable {
    debug_assert_eq!(bindings.len(), spec.fields.len());
    let mut rows = Vec::with_capacity(raw.rows.len());
    for row_idx in 0..raw.rows.len() {
        let mut row = Vec::with_capacity(spec.fields.len());
        for (binding, field) in bindings.iter().zip(spec.fields) {
            let cell = match binding.column {
                Some(column) => raw.cell(row_idx, column).trim().to_string(),
                None => match field.fallback {
                    Fallback::Literal(value) => value.to_string(),
                    Fallback::RowIndex => (row_idx + 1).to_string(),
                },
            };
            row.push(cell);
        }
        rows.push(row);
    }
    OutputTable {
        fields: spec.field_names(),
        rows,
    }
}
