//! Observational match diagnostics.
//!
//! The report records, per input category, how many rows were read and which
//! source header (if any) each logical field bound to. It is surfaced to the
//! user for transparency only and never feeds back into the transforms.

use serde::Serialize;

use crate::error::BundleError;
use crate::resolve::{ColumnBinding, MatchConfidence};

pub const UNMATCHED: &str = "unmatched";

#[derive(Debug, Clone, Serialize)]
pub struct FieldOutcome {
    pub field: String,
    pub matched_header: Option<String>,
    pub confidence: MatchConfidence,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDiagnostics {
    pub category: String,
    /// File name of the source upload, absent for missing categories.
    pub source: Option<String>,
    pub rows_read: usize,
    pub fields: Vec<FieldOutcome>,
}

impl CategoryDiagnostics {
    pub fn from_bindings(
        category: &str,
        source: Option<String>,
        rows_read: usize,
        bindings: &[ColumnBinding],
    ) -> Self {
        let fields = bindings
            .iter()
            .map(|binding| FieldOutcome {
                field: binding.field.to_string(),
                matched_header: binding.header.clone(),
                confidence: binding.confidence,
            })
            .collect();
        Self {
            category: category.to_string(),
            source,
            rows_read,
            fields,
        }
    }

    /// Rows for the elastic table rendering used by `inspect`.
    pub fn table_rows(&self) -> Vec<Vec<String>> {
        self.fields
            .iter()
            .map(|outcome| {
                vec![
                    outcome.field.clone(),
                    outcome
                        .matched_header
                        .clone()
                        .unwrap_or_else(|| UNMATCHED.to_string()),
                    outcome.confidence.as_str().to_string(),
                ]
            })
            .collect()
    }
}

pub fn table_headers() -> Vec<String> {
    vec![
        "field".to_string(),
        "matched header".to_string(),
        "confidence".to_string(),
    ]
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticsReport {
    pub categories: Vec<CategoryDiagnostics>,
}

impl DiagnosticsReport {
    pub fn push(&mut self, diags: CategoryDiagnostics) {
        self.categories.push(diags);
    }

    /// Serializes the whole report to the diagnostics CSV bundled into the
    /// archive: one row per (category, field) with the row count repeated.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, BundleError> {
        let mut buf = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            writer.write_record([
                "Category",
                "Source",
                "RowsRead",
                "Field",
                "MatchedHeader",
                "Confidence",
            ])?;
            for category in &self.categories {
                let rows_read = category.rows_read.to_string();
                for outcome in &category.fields {
                    writer.write_record([
                        category.category.as_str(),
                        category.source.as_deref().unwrap_or(""),
                        rows_read.as_str(),
                        outcome.field.as_str(),
                        outcome.matched_header.as_deref().unwrap_or(UNMATCHED),
                        outcome.confidence.as_str(),
                    ])?;
                }
            }
            writer.flush().map_err(BundleError::from)?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve;
    use crate::schema::Category;

    #[test]
    fn unmatched_fields_are_reported_by_name() {
        let headers = vec!["Code".to_string()];
        let bindings = resolve::resolve(&headers, &Category::Rooms.spec());
        let diags = CategoryDiagnostics::from_bindings("rooms", None, 3, &bindings);
        assert_eq!(diags.rows_read, 3);
        let rows = diags.table_rows();
        assert_eq!(rows[0], vec!["RoomCode", "Code", "exact"]);
        assert_eq!(rows[2], vec!["Capacity", UNMATCHED, "none"]);
    }

    #[test]
    fn report_csv_lists_every_category_field_pair() {
        let headers: Vec<String> = Vec::new();
        let bindings = resolve::resolve(&headers, &Category::Rooms.spec());
        let mut report = DiagnosticsReport::default();
        report.push(CategoryDiagnostics::from_bindings(
            "rooms", None, 0, &bindings,
        ));
        let text = String::from_utf8(report.to_csv_bytes().expect("csv")).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + Category::Rooms.spec().fields.len());
        assert!(lines[1].contains("rooms"));
        assert!(lines[1].contains(UNMATCHED));
    }

    #[test]
    fn report_serializes_to_json() {
        let headers = vec!["Code".to_string()];
        let bindings = resolve::resolve(&headers, &Category::Rooms.spec());
        let diags = CategoryDiagnostics::from_bindings("rooms", Some("r.csv".into()), 1, &bindings);
        let json = serde_json::to_value(&diags).expect("json");
        assert_eq!(json["category"], "rooms");
        assert_eq!(json["fields"][0]["confidence"], "exact");
    }
}
