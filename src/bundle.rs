//! Output assembly: orchestrates the per-category builds and packages the
//! seven CSV tables plus the diagnostics report into one ZIP archive.
//!
//! Per-file parsing problems degrade to an empty category with a warning;
//! only archive I/O failures abort a build. The guiding rule is to never
//! produce nothing because one input was slightly wrong.

use std::{
    fs::File,
    io::{Seek, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{info, warn};
use zip::{CompressionMethod, write::SimpleFileOptions};

use crate::{
    builders::{self, CategoryBuild},
    cli::BuildArgs,
    diagnostics::{CategoryDiagnostics, DiagnosticsReport},
    error::BundleError,
    ingest::{self, RawTable},
    resolve,
    schema::Category,
    source_name,
    transform::OutputTable,
};

pub const DIAGNOSTICS_FILE: &str = "diagnostics.csv";

/// Source files for one build, any subset of which may be present.
#[derive(Debug, Clone, Default)]
pub struct BundleInputs {
    pub rooms: Option<PathBuf>,
    pub teachers: Option<PathBuf>,
    pub students: Vec<PathBuf>,
    pub courses: Vec<PathBuf>,
    pub subjects: Option<PathBuf>,
    pub classes: Option<PathBuf>,
}

/// The seven built tables in archive order plus the diagnostics report.
#[derive(Debug, Clone)]
pub struct BundleOutputs {
    pub tables: Vec<(Category, OutputTable)>,
    pub report: DiagnosticsReport,
}

impl BundleOutputs {
    pub fn table(&self, category: Category) -> Option<&OutputTable> {
        self.tables
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, table)| table)
    }
}

pub fn execute(args: &BuildArgs) -> Result<()> {
    let inputs = BundleInputs {
        rooms: args.rooms.clone(),
        teachers: args.teachers.clone(),
        students: args.students.clone(),
        courses: args.courses.clone(),
        subjects: args.subjects.clone(),
        classes: args.classes.clone(),
    };
    let outputs = build_outputs(&inputs, args.delimiter);
    for (category, table) in &outputs.tables {
        info!(
            "{} ✓ ({} row(s))",
            category.file_name(),
            table.rows.len()
        );
    }
    let file = File::create(&args.output)
        .with_context(|| format!("Creating archive {:?}", args.output))?;
    write_archive(&outputs, file)
        .with_context(|| format!("Writing archive {:?}", args.output))?;
    info!("Bundle written to '{}'", args.output.display());
    Ok(())
}

/// Runs the full ingest/resolve/transform pipeline for every category.
/// Infallible by design: per-file failures degrade to empty tables and are
/// recorded in the diagnostics report.
pub fn build_outputs(inputs: &BundleInputs, delimiter: Option<u8>) -> BundleOutputs {
    let mut report = DiagnosticsReport::default();

    let rooms = single_category(
        inputs.rooms.as_deref(),
        delimiter,
        Category::Rooms,
        |raw, source| builders::build_rooms(raw, source),
    );
    let teachers = single_category(
        inputs.teachers.as_deref(),
        delimiter,
        Category::Teachers,
        |raw, source| builders::build_teachers(raw, source),
    );
    let subjects = single_category(
        inputs.subjects.as_deref(),
        delimiter,
        Category::Subjects,
        |raw, source| builders::build_subjects(raw, source),
    );

    let student_files = load_many(&inputs.students, delimiter, Category::Students);
    let (student_table, student_diags) = builders::build_students(&student_files);
    let memberships = builders::build_memberships(&student_files);

    let course_files = load_many(&inputs.courses, delimiter, Category::Courses);
    let (course_table, course_diags) = builders::build_courses(&course_files);

    // The timetable build needs the course catalogue for rotation lookup.
    let classes = single_category(
        inputs.classes.as_deref(),
        delimiter,
        Category::ClassesAndLessons,
        |raw, source| builders::build_classes(raw, source, &course_table),
    );

    report.push(rooms.diags);
    report.push(teachers.diags);
    if student_diags.is_empty() {
        report.push(empty_diags(Category::Students));
    }
    for diags in student_diags {
        report.push(diags);
    }
    report.push(memberships.diags);
    report.push(subjects.diags);
    if course_diags.is_empty() {
        report.push(empty_diags(Category::Courses));
    }
    for diags in course_diags {
        report.push(diags);
    }
    report.push(classes.diags);

    let tables = vec![
        (Category::Rooms, rooms.table),
        (Category::Teachers, teachers.table),
        (Category::Students, student_table),
        (Category::ClassMemberships, memberships.table),
        (Category::Subjects, subjects.table),
        (Category::Courses, course_table),
        (Category::ClassesAndLessons, classes.table),
    ];
    BundleOutputs { tables, report }
}

/// Serializes every table plus the diagnostics CSV into `writer`.
pub fn write_archive<W: Write + Seek>(
    outputs: &BundleOutputs,
    writer: W,
) -> Result<(), BundleError> {
    let mut archive = zip::ZipWriter::new(writer);
    let options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (category, table) in &outputs.tables {
        archive.start_file(category.file_name(), options)?;
        archive.write_all(&table.to_csv_bytes()?)?;
    }
    archive.start_file(DIAGNOSTICS_FILE, options)?;
    archive.write_all(&outputs.report.to_csv_bytes()?)?;
    archive.finish()?;
    Ok(())
}

fn single_category<F>(
    path: Option<&Path>,
    delimiter: Option<u8>,
    category: Category,
    build: F,
) -> CategoryBuild
where
    F: FnOnce(&RawTable, Option<String>) -> CategoryBuild,
{
    match load_degraded(path, delimiter, category) {
        Some((source, raw)) => build(&raw, Some(source)),
        None => CategoryBuild {
            table: OutputTable::empty(&category.spec()),
            diags: empty_diags(category),
        },
    }
}

fn load_many(
    paths: &[PathBuf],
    delimiter: Option<u8>,
    category: Category,
) -> Vec<(String, RawTable)> {
    paths
        .iter()
        .filter_map(|path| load_degraded(Some(path), delimiter, category))
        .collect()
}

/// Loads one input, degrading any per-file failure to "no input" with a
/// warning so the rest of the build continues.
fn load_degraded(
    path: Option<&Path>,
    delimiter: Option<u8>,
    category: Category,
) -> Option<(String, RawTable)> {
    let path = path?;
    match ingest::load_table(path, delimiter) {
        Ok(raw) => {
            let source = source_name(path).unwrap_or_else(|| path.display().to_string());
            Some((source, raw))
        }
        Err(err @ BundleError::EmptyInput { .. }) => {
            warn!("{} input ignored: {err}", category.label());
            None
        }
        Err(err) => {
            warn!("skipping {} input: {err}", category.label());
            None
        }
    }
}

/// All-unmatched diagnostics for a category with no usable input.
fn empty_diags(category: Category) -> CategoryDiagnostics {
    let bindings = resolve::resolve(&[], &category.spec());
    CategoryDiagnostics::from_bindings(category.label(), None, 0, &bindings)
}
