use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for the bundle pipeline.
///
/// Per-file problems (`UnreadableFile`, `EmptyInput`) are isolated to their
/// category and degrade to an empty output table; only `Packaging` aborts a
/// whole build, since a partial archive is useless.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The input could not be parsed as delimited text or as a workbook.
    #[error("cannot read {path:?}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },

    /// A workbook exists but no sheet has a header row plus at least one
    /// data row.
    #[error("workbook {path:?} has no sheet with any data")]
    EmptyInput { path: PathBuf },

    /// Archive assembly failed at the I/O layer.
    #[error("failed to assemble archive: {0}")]
    Packaging(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<std::io::Error> for BundleError {
    fn from(err: std::io::Error) -> Self {
        BundleError::Packaging(Box::new(err))
    }
}

impl From<zip::result::ZipError> for BundleError {
    fn from(err: zip::result::ZipError) -> Self {
        BundleError::Packaging(Box::new(err))
    }
}

impl From<csv::Error> for BundleError {
    fn from(err: csv::Error) -> Self {
        BundleError::Packaging(Box::new(err))
    }
}
