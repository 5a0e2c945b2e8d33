//! Per-category builders.
//!
//! Each builder runs the generic resolve/transform pass for its target
//! schema and then applies the category's domain rules: name splitting,
//! year-level inference from file names, rotation normalization, class
//! membership melting, and course-code prefix splitting.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use itertools::Itertools;
use log::debug;
use regex::Regex;

use crate::diagnostics::CategoryDiagnostics;
use crate::ingest::RawTable;
use crate::resolve::{self, ColumnBinding, MatchConfidence};
use crate::schema::{Category, aux};
use crate::transform::{self, OutputTable};

/// One built output table plus its diagnostics entry.
#[derive(Debug, Clone)]
pub struct CategoryBuild {
    pub table: OutputTable,
    pub diags: CategoryDiagnostics,
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:yr|year)[\s\-]?(\d{1,2})").expect("year pattern"))
}

fn rotation_sep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[;:/\s]+").expect("separator pattern"))
}

fn class_column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^class[\s_]*\d+$").expect("class column pattern"))
}

pub fn build_rooms(raw: &RawTable, source: Option<String>) -> CategoryBuild {
    let spec = Category::Rooms.spec();
    let bindings = resolve::resolve(&raw.headers, &spec);
    let mut table = transform::transform(raw, &bindings, &spec);
    if let Some(capacity) = table.field_index("Capacity") {
        for row in &mut table.rows {
            row[capacity] = coerce_capacity(&row[capacity]);
        }
    }
    let diags = CategoryDiagnostics::from_bindings(
        Category::Rooms.label(),
        source,
        table.rows.len(),
        &bindings,
    );
    CategoryBuild { table, diags }
}

pub fn build_teachers(raw: &RawTable, source: Option<String>) -> CategoryBuild {
    let spec = Category::Teachers.spec();
    let bindings = resolve::resolve(&raw.headers, &spec);
    let mut table = transform::transform(raw, &bindings, &spec);
    apply_name_split(&bindings, &mut table);
    let diags = CategoryDiagnostics::from_bindings(
        Category::Teachers.label(),
        source,
        table.rows.len(),
        &bindings,
    );
    CategoryBuild { table, diags }
}

/// Builds the combined student table from the year-level uploads. Each file
/// contributes its rows; the year level inferred from the file name fills
/// the three curriculum fields.
pub fn build_students(files: &[(String, RawTable)]) -> (OutputTable, Vec<CategoryDiagnostics>) {
    let spec = Category::Students.spec();
    let mut combined = OutputTable::empty(&spec);
    let mut diags = Vec::with_capacity(files.len());
    for (name, raw) in files {
        let bindings = resolve::resolve(&raw.headers, &spec);
        let mut table = transform::transform(raw, &bindings, &spec);
        apply_name_split(&bindings, &mut table);
        let year = infer_year_from_name(name);
        for field in ["YearLevelCode", "YearLevel", "Curriculum"] {
            if let Some(idx) = table.field_index(field) {
                for row in &mut table.rows {
                    row[idx] = year.clone();
                }
            }
        }
        diags.push(CategoryDiagnostics::from_bindings(
            Category::Students.label(),
            Some(name.clone()),
            table.rows.len(),
            &bindings,
        ));
        combined.rows.extend(table.rows);
    }
    (combined, diags)
}

/// Melts the wide `Class 1..Class N` columns of the student uploads into
/// (StudentCode, ClassCode) pairs, skipping blank class cells.
pub fn build_memberships(files: &[(String, RawTable)]) -> CategoryBuild {
    let spec = Category::ClassMemberships.spec();
    let mut table = OutputTable::empty(&spec);
    let mut code_header: Option<(String, MatchConfidence)> = None;
    let mut class_header: Option<String> = None;

    for (name, raw) in files {
        let Some((code_col, confidence)) = resolve::pick_column(&raw.headers, aux::MEMBER_CODE)
        else {
            debug!("no student code column in '{name}', skipping for memberships");
            continue;
        };
        let class_cols = membership_class_columns(&raw.headers, code_col);
        if class_cols.is_empty() {
            debug!("no class columns in '{name}', skipping for memberships");
            continue;
        }
        if code_header.is_none() {
            code_header = Some((raw.headers[code_col].clone(), confidence));
            class_header = Some(raw.headers[class_cols[0]].clone());
        }
        for row_idx in 0..raw.rows.len() {
            let code = raw.cell(row_idx, code_col).trim().to_string();
            for &col in &class_cols {
                let class_code = raw.cell(row_idx, col).trim();
                if !class_code.is_empty() {
                    table.rows.push(vec![code.clone(), class_code.to_string()]);
                }
            }
        }
    }

    let diags = CategoryDiagnostics {
        category: Category::ClassMemberships.label().to_string(),
        source: None,
        rows_read: table.rows.len(),
        fields: vec![
            crate::diagnostics::FieldOutcome {
                field: "StudentCode".to_string(),
                matched_header: code_header.as_ref().map(|(h, _)| h.clone()),
                confidence: code_header
                    .map(|(_, c)| c)
                    .unwrap_or(MatchConfidence::None),
            },
            crate::diagnostics::FieldOutcome {
                field: "ClassCode".to_string(),
                matched_header: class_header.clone(),
                confidence: if class_header.is_some() {
                    MatchConfidence::Substring
                } else {
                    MatchConfidence::None
                },
            },
        ],
    };
    CategoryBuild { table, diags }
}

pub fn build_subjects(raw: &RawTable, source: Option<String>) -> CategoryBuild {
    let spec = Category::Subjects.spec();
    let bindings = resolve::resolve(&raw.headers, &spec);
    let table = transform::transform(raw, &bindings, &spec);
    let diags = CategoryDiagnostics::from_bindings(
        Category::Subjects.label(),
        source,
        table.rows.len(),
        &bindings,
    );
    CategoryBuild { table, diags }
}

/// Builds the course catalogue from the class-data uploads, normalizing
/// rotations and deriving the course type from the line column.
pub fn build_courses(files: &[(String, RawTable)]) -> (OutputTable, Vec<CategoryDiagnostics>) {
    let spec = Category::Courses.spec();
    let mut combined = OutputTable::empty(&spec);
    let mut diags = Vec::with_capacity(files.len());
    for (name, raw) in files {
        let bindings = resolve::resolve(&raw.headers, &spec);
        let mut table = transform::transform(raw, &bindings, &spec);
        let year = infer_year_from_name(name);
        if let Some(idx) = table.field_index("CurriculumName") {
            for row in &mut table.rows {
                row[idx] = year.clone();
            }
        }
        if let Some(idx) = table.field_index("Type") {
            for row in &mut table.rows {
                row[idx] = course_type_label(&row[idx]).to_string();
            }
        }
        if let Some(idx) = table.field_index("RotationSet") {
            for row in &mut table.rows {
                row[idx] = map_rotation(&row[idx]);
            }
        }
        diags.push(CategoryDiagnostics::from_bindings(
            Category::Courses.label(),
            Some(name.clone()),
            table.rows.len(),
            &bindings,
        ));
        combined.rows.extend(table.rows);
    }
    (combined, diags)
}

/// Builds the timetable table. PeriodCode concatenates the day and period
/// columns; the class column splits into a known CourseCode prefix plus the
/// remaining ClassIdentifier; Rotation prefers the course catalogue's
/// RotationSet over the source rotation column.
pub fn build_classes(
    raw: &RawTable,
    source: Option<String>,
    courses: &OutputTable,
) -> CategoryBuild {
    let spec = Category::ClassesAndLessons.spec();
    let bindings = resolve::resolve(&raw.headers, &spec);
    let mut table = transform::transform(raw, &bindings, &spec);

    let day_col = resolve::pick_column(&raw.headers, aux::DAY).map(|(idx, _)| idx);
    let period_col = resolve::pick_column(&raw.headers, aux::PERIOD).map(|(idx, _)| idx);
    let class_col = resolve::pick_column(&raw.headers, aux::CLASS).map(|(idx, _)| idx);

    let (codes, rotations) = course_catalogue(courses);

    let period_idx = table.field_index("PeriodCode");
    let course_idx = table.field_index("CourseCode");
    let ident_idx = table.field_index("ClassIdentifier");
    let rotation_idx = table.field_index("Rotation");

    for row_idx in 0..raw.rows.len() {
        if let Some(idx) = period_idx {
            let day = day_col.map(|c| raw.cell(row_idx, c).trim()).unwrap_or("");
            let period = period_col.map(|c| raw.cell(row_idx, c).trim()).unwrap_or("");
            table.rows[row_idx][idx] = format!("{day}{period}");
        }
        let (course_code, identifier) = match class_col {
            Some(col) => split_class_code(&codes, raw.cell(row_idx, col).trim()),
            None => (String::new(), String::new()),
        };
        if let Some(idx) = rotation_idx
            && !course_code.is_empty()
            && let Some(rotation) = rotations.get(&course_code)
        {
            table.rows[row_idx][idx] = rotation.clone();
        }
        if let Some(idx) = course_idx {
            table.rows[row_idx][idx] = course_code;
        }
        if let Some(idx) = ident_idx {
            table.rows[row_idx][idx] = identifier;
        }
    }

    let diags = CategoryDiagnostics::from_bindings(
        Category::ClassesAndLessons.label(),
        source,
        table.rows.len(),
        &bindings,
    );
    CategoryBuild { table, diags }
}

/// Known course codes (longest first) and their rotation lookup.
fn course_catalogue(courses: &OutputTable) -> (Vec<String>, HashMap<String, String>) {
    let Some(code_idx) = courses.field_index("CourseCode") else {
        return (Vec::new(), HashMap::new());
    };
    let rotation_idx = courses.field_index("RotationSet");
    let mut rotations = HashMap::new();
    let codes = courses
        .rows
        .iter()
        .filter_map(|row| {
            let code = row.get(code_idx)?.trim();
            if code.is_empty() {
                return None;
            }
            if let Some(idx) = rotation_idx {
                rotations
                    .entry(code.to_string())
                    .or_insert_with(|| row.get(idx).cloned().unwrap_or_default());
            }
            Some(code.to_string())
        })
        .unique()
        .sorted_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)))
        .collect();
    (codes, rotations)
}

/// Splits a class label into (course code, class identifier) by matching
/// the longest known course-code prefix.
fn split_class_code(codes: &[String], value: &str) -> (String, String) {
    for code in codes {
        if let Some(remainder) = value.strip_prefix(code.as_str()) {
            let identifier = remainder
                .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '.' | '_' | '/'));
            return (code.clone(), identifier.to_string());
        }
    }
    (String::new(), value.to_string())
}

/// Splits a combined person name. `"Last, First"` splits on the comma;
/// otherwise the final whitespace-separated token is the last name.
pub fn split_person_name(name: &str) -> (String, String) {
    let trimmed = name.trim();
    if let Some((last, first)) = trimmed.split_once(',') {
        return (first.trim().to_string(), last.trim().to_string());
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    match parts.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (String::new(), only.to_string()),
        [rest @ .., last] => (rest.join(" "), last.to_string()),
    }
}

/// Fills FirstName/LastName from a combined name column. The resolver binds
/// a bare "Name" header to FirstName with substring confidence; when that
/// happens and no real last-name column exists, the bound column carries
/// the full name and is split in place.
fn apply_name_split(bindings: &[ColumnBinding], table: &mut OutputTable) {
    let first = bindings.iter().find(|b| b.field == "FirstName");
    let last = bindings.iter().find(|b| b.field == "LastName");
    let (Some(first), Some(last)) = (first, last) else {
        return;
    };
    if last.is_matched() || first.confidence != MatchConfidence::Substring {
        return;
    }
    let holds_combined_name = first
        .header
        .as_deref()
        .is_some_and(|h| !h.to_lowercase().contains("first"));
    if !holds_combined_name {
        return;
    }
    let (Some(first_idx), Some(last_idx)) = (
        table.field_index("FirstName"),
        table.field_index("LastName"),
    ) else {
        return;
    };
    for row in &mut table.rows {
        let (first_name, last_name) = split_person_name(&row[first_idx]);
        row[first_idx] = first_name;
        row[last_idx] = last_name;
    }
}

/// Year level from an upload file name, e.g. `students-yr7.csv` -> "7".
pub fn infer_year_from_name(name: &str) -> String {
    year_re()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Normalizes a raw rotation cell into the fixed rotation vocabulary.
pub fn map_rotation(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "WHOLE YEAR".to_string();
    }
    let normalized = rotation_sep_re().replace_all(trimmed, ",");
    let parts: Vec<String> = normalized
        .split(',')
        .map(|part| part.chars().filter(|c| c.is_ascii_digit()).collect::<String>())
        .filter(|part| !part.is_empty())
        .collect();
    let terms: BTreeSet<&str> = parts
        .iter()
        .map(String::as_str)
        .filter(|p| matches!(*p, "1" | "2" | "3" | "4"))
        .collect();
    let term_list: Vec<&str> = terms.iter().copied().collect();
    match term_list.as_slice() {
        ["1", "2"] => return "SEMESTER 1".to_string(),
        ["3", "4"] => return "SEMESTER 2".to_string(),
        ["1"] => return "TERM 1".to_string(),
        ["2"] => return "TERM 2".to_string(),
        ["3"] => return "TERM 3".to_string(),
        ["4"] => return "TERM 4".to_string(),
        _ => {}
    }
    let labels: Vec<String> = parts
        .iter()
        .map(|part| match part.as_str() {
            "1" => "TERM 1".to_string(),
            "2" => "TERM 2".to_string(),
            "3" => "TERM 3".to_string(),
            "4" => "TERM 4".to_string(),
            other => other.to_string(),
        })
        .unique()
        .sorted()
        .collect();
    if labels.is_empty() {
        "WHOLE YEAR".to_string()
    } else {
        labels.join(", ")
    }
}

/// Room capacity coerced to a whole number, "0" when non-numeric or blank.
pub fn coerce_capacity(value: &str) -> String {
    value
        .trim()
        .parse::<f64>()
        .map(|parsed| (parsed as i64).to_string())
        .unwrap_or_else(|_| "0".to_string())
}

/// "group" lines are core offerings; everything else is an elective.
pub fn course_type_label(value: &str) -> &'static str {
    if value.trim().to_lowercase().starts_with("group") {
        "Core"
    } else {
        "Elective"
    }
}

fn squash(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Wide class columns of a student upload: `Class 1..Class N` headers, or
/// any header containing "class" when no numbered columns exist.
fn membership_class_columns(headers: &[String], code_col: usize) -> Vec<usize> {
    let numbered: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| class_column_re().is_match(header.trim()))
        .map(|(idx, _)| idx)
        .collect();
    if !numbered.is_empty() {
        return numbered;
    }
    headers
        .iter()
        .enumerate()
        .filter(|(idx, header)| *idx != code_col && squash(header).contains("class"))
        .map(|(idx, _)| idx)
        .collect()
}
