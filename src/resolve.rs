//! Column resolution: binds each logical field of a schema to the
//! best-matching source header.
//!
//! Scoring is deterministic: an exact (case-insensitive, trimmed) alias
//! match scores 2, a substring containment in either direction scores 1,
//! anything else 0. The earliest header wins ties, and a header claimed by
//! an earlier field is never reused for a later one.

use serde::Serialize;

use crate::schema::SchemaSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    Exact,
    Substring,
    None,
}

impl MatchConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchConfidence::Exact => "exact",
            MatchConfidence::Substring => "substring",
            MatchConfidence::None => "none",
        }
    }
}

/// Outcome of resolving one logical field against the source headers.
#[derive(Debug, Clone)]
pub struct ColumnBinding {
    pub field: &'static str,
    /// Matched source header, `None` when the field is unmatched.
    pub header: Option<String>,
    /// Column index of the matched header in the source table.
    pub column: Option<usize>,
    pub confidence: MatchConfidence,
}

impl ColumnBinding {
    fn unmatched(field: &'static str) -> Self {
        Self {
            field,
            header: None,
            column: None,
            confidence: MatchConfidence::None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.column.is_some()
    }
}

/// Resolves every field of `spec` against `headers`, in schema order.
pub fn resolve(headers: &[String], spec: &SchemaSpec) -> Vec<ColumnBinding> {
    let mut claimed = vec![false; headers.len()];
    let mut bindings = Vec::with_capacity(spec.fields.len());
    for field in spec.fields {
        let binding = match best_candidate(headers, &claimed, field.aliases) {
            Some((column, score)) => {
                claimed[column] = true;
                ColumnBinding {
                    field: field.name,
                    header: Some(headers[column].clone()),
                    column: Some(column),
                    confidence: if score == 2 {
                        MatchConfidence::Exact
                    } else {
                        MatchConfidence::Substring
                    },
                }
            }
            None => ColumnBinding::unmatched(field.name),
        };
        bindings.push(binding);
    }
    bindings
}

/// Single-column lookup against an alias set, ignoring claims. Used for
/// auxiliary columns consumed by builder passes.
pub fn pick_column(headers: &[String], aliases: &[&str]) -> Option<(usize, MatchConfidence)> {
    let unclaimed = vec![false; headers.len()];
    best_candidate(headers, &unclaimed, aliases).map(|(column, score)| {
        let confidence = if score == 2 {
            MatchConfidence::Exact
        } else {
            MatchConfidence::Substring
        };
        (column, confidence)
    })
}

fn best_candidate(
    headers: &[String],
    claimed: &[bool],
    aliases: &[&str],
) -> Option<(usize, u8)> {
    let mut best: Option<(usize, u8)> = None;
    for (idx, header) in headers.iter().enumerate() {
        if claimed[idx] {
            continue;
        }
        let score = score_header(header, aliases);
        if score == 0 {
            continue;
        }
        // Strict comparison keeps the earliest header among equal scores.
        if best.is_none_or(|(_, current)| score > current) {
            best = Some((idx, score));
        }
    }
    best
}

fn score_header(header: &str, aliases: &[&str]) -> u8 {
    let normalized = header.trim().to_lowercase();
    if normalized.is_empty() {
        return 0;
    }
    let mut score = 0u8;
    for alias in aliases {
        if normalized == *alias {
            return 2;
        }
        if normalized.contains(alias) || alias.contains(normalized.as_str()) {
            score = 1;
        }
    }
    score
}
