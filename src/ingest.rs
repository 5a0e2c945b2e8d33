//! Tolerant tabular ingestion.
//!
//! All source spreadsheets flow through this module. It provides:
//!
//! - **Format detection**: workbook extensions (`.xlsx`, `.xls`, `.xlsm`,
//!   `.xlsb`, `.ods`) route through `calamine`; everything else is treated
//!   as delimited text.
//! - **Delimiter auto-detection**: candidates `, ; \t |` are tried in that
//!   priority order; the candidate yielding the most header columns with a
//!   clean strict parse wins, earliest candidate breaking ties.
//! - **Sheet selection**: the first sheet in document order with a header
//!   row and at least one data row is used.
//! - **Decoding**: BOM sniffing via `encoding_rs`, then UTF-8 with a
//!   Windows-1252 fallback for legacy exports.
//! - **Header normalization**: trimming plus duplicate disambiguation.

use std::{fs, path::Path};

use calamine::{DataType, Reader, open_workbook_auto};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::debug;

use crate::error::BundleError;

/// Candidate delimiters in tie-break priority order.
pub const DELIMITER_CANDIDATES: &[u8] = &[b',', b';', b'\t', b'|'];

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

/// An uploaded table after ingestion: normalized headers plus untyped rows.
///
/// Every row holds exactly `headers.len()` cells; the table is read-only
/// once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell value at (row, column), empty string when out of bounds.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Loads one source file into a [`RawTable`], auto-detecting format and
/// delimiter unless one is forced.
pub fn load_table(path: &Path, delimiter: Option<u8>) -> Result<RawTable, BundleError> {
    if is_workbook_path(path) {
        load_workbook(path)
    } else {
        load_delimited(path, delimiter)
    }
}

fn is_workbook_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}

fn load_delimited(path: &Path, forced: Option<u8>) -> Result<RawTable, BundleError> {
    let bytes = fs::read(path).map_err(|err| BundleError::UnreadableFile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let text = decode_text(&bytes, path)?;

    if let Some(delimiter) = forced {
        return parse_with(&text, delimiter).ok_or_else(|| BundleError::UnreadableFile {
            path: path.to_path_buf(),
            reason: format!(
                "cannot parse with delimiter '{}'",
                crate::printable_delimiter(delimiter)
            ),
        });
    }

    let mut best: Option<(u8, RawTable)> = None;
    for &candidate in DELIMITER_CANDIDATES {
        let Some(table) = parse_with(&text, candidate) else {
            continue;
        };
        let improves = match &best {
            Some((_, current)) => table.headers.len() > current.headers.len(),
            None => true,
        };
        if improves {
            best = Some((candidate, table));
        }
    }
    match best {
        Some((delimiter, table)) => {
            debug!(
                "Detected delimiter '{}' for {:?} ({} column(s))",
                crate::printable_delimiter(delimiter),
                path,
                table.headers.len()
            );
            Ok(table)
        }
        None => Err(BundleError::UnreadableFile {
            path: path.to_path_buf(),
            reason: "no candidate delimiter produced a clean parse".to_string(),
        }),
    }
}

/// Strict parse under one candidate delimiter; `None` on any parse error.
fn parse_with(text: &str, delimiter: u8) -> Option<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .ok()?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.ok()?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    Some(RawTable::new(normalize_headers(headers), rows))
}

fn decode_text(bytes: &[u8], path: &Path) -> Result<String, BundleError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            return Err(BundleError::UnreadableFile {
                path: path.to_path_buf(),
                reason: format!("invalid {} text", encoding.name()),
            });
        }
        return Ok(text.into_owned());
    }
    let (text, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return Ok(text.into_owned());
    }
    // Legacy exports from desktop tools are commonly Windows-1252.
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    Ok(text.into_owned())
}

/// Trims headers and disambiguates duplicates by suffixing later
/// occurrences with their 1-based occurrence counter (`Name`, `Name 2`).
pub fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    headers
        .into_iter()
        .map(|header| {
            let trimmed = header.trim().to_string();
            let count = seen.entry(trimmed.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                trimmed
            } else {
                format!("{trimmed} {count}")
            }
        })
        .collect()
}

fn load_workbook(path: &Path) -> Result<RawTable, BundleError> {
    let mut workbook = open_workbook_auto(path).map_err(|err| BundleError::UnreadableFile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    let sheet_names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let Some(range) = workbook.worksheet_range(&name) else {
            continue;
        };
        let range = range.map_err(|err| BundleError::UnreadableFile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let grid = range
            .rows()
            .map(|row| row.iter().map(|cell| cell_to_string(Some(cell))).collect())
            .collect::<Vec<Vec<String>>>();
        sheets.push((name, grid));
    }

    match first_nonempty_sheet(&sheets) {
        Some((name, table)) => {
            debug!("Selected sheet '{name}' from {path:?}");
            Ok(table)
        }
        None => Err(BundleError::EmptyInput {
            path: path.to_path_buf(),
        }),
    }
}

/// Picks the first sheet in document order carrying a header row plus at
/// least one data row.
fn first_nonempty_sheet(sheets: &[(String, Vec<Vec<String>>)]) -> Option<(String, RawTable)> {
    for (name, grid) in sheets {
        if grid.len() < 2 {
            continue;
        }
        let headers = normalize_headers(grid[0].clone());
        let width = headers.len();
        let rows = grid[1..]
            .iter()
            .map(|row| {
                let mut cells = row.clone();
                cells.resize(width, String::new());
                cells
            })
            .collect();
        return Some((name.clone(), RawTable::new(headers, rows)));
    }
    None
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => {
            if value.fract() == 0.0 {
                (*value as i64).to_string()
            } else {
                value.to_string()
            }
        }
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
