use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Interchange payload failed to parse or lacks required top-level fields.
    #[error("Import failed: {0}")]
    ImportFormat(String),

    /// The document would break an identity or singleton rule.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The off-screen surface could not produce a height.
    #[error("Measurement unavailable: {0}")]
    MeasurementUnavailable(String),

    /// A page could not be captured for export. No file is written.
    #[error("Export failed: {0}")]
    ExportCapture(String),

    #[error("Section {0} cannot be deleted")]
    NotDeletable(String),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Unknown item {1} in section {0}")]
    UnknownItem(String, String),

    #[error("Not found: {0}")]
    NotFound(String),
}
