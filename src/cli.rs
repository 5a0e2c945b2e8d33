use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::schema::Category;

#[derive(Debug, Parser)]
#[command(author, version, about = "Bundle school spreadsheet exports into normalized CSV tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the output archive from up to six source spreadsheets
    Build(BuildArgs),
    /// Show column-match diagnostics for one input without writing anything
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Rooms spreadsheet (CSV/TSV or workbook)
    #[arg(long)]
    pub rooms: Option<PathBuf>,
    /// Teachers spreadsheet
    #[arg(long)]
    pub teachers: Option<PathBuf>,
    /// Student spreadsheets, repeatable, typically one per year-level export
    #[arg(long = "students", action = clap::ArgAction::Append)]
    pub students: Vec<PathBuf>,
    /// Course/class-data spreadsheets, repeatable
    #[arg(long = "courses", action = clap::ArgAction::Append)]
    pub courses: Vec<PathBuf>,
    /// Subjects spreadsheet
    #[arg(long)]
    pub subjects: Option<PathBuf>,
    /// Classes & lessons (timetable) spreadsheet
    #[arg(long)]
    pub classes: Option<PathBuf>,
    /// Destination archive path
    #[arg(short = 'o', long = "output", default_value = "school-data-bundle.zip")]
    pub output: PathBuf,
    /// Force a delimiter for text inputs instead of auto-detection
    /// (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Input spreadsheet to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Category whose schema the input is matched against
    #[arg(long, value_enum)]
    pub category: CategoryArg,
    /// Emit the diagnostics as JSON instead of a table
    #[arg(long)]
    pub json: bool,
    /// Force a delimiter for text inputs instead of auto-detection
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum CategoryArg {
    Rooms,
    Teachers,
    Students,
    Subjects,
    Courses,
    Classes,
}

impl CategoryArg {
    pub fn category(self) -> Category {
        match self {
            CategoryArg::Rooms => Category::Rooms,
            CategoryArg::Teachers => Category::Teachers,
            CategoryArg::Students => Category::Students,
            CategoryArg::Subjects => Category::Subjects,
            CategoryArg::Courses => Category::Courses,
            CategoryArg::Classes => Category::ClassesAndLessons,
        }
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_named_and_literal_forms() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("pipe").unwrap(), b'|');
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
