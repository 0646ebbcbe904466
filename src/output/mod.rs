//! Exporter boundary and writers.

use crate::DayResult;

mod csv;

pub use csv::CsvExporter;

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Sink for completed days.
///
/// The dumper hands over every [`DayResult`] it produces, empty days
/// included, so a sink can deliberately skip empty tables rather than
/// silently never seeing them.
pub trait Exporter {
    /// Consume one completed day.
    fn export_day(&mut self, result: &DayResult) -> OutputResult<()>;
}

/// An exporter that discards everything. Useful when only the raw cache
/// files are wanted.
#[derive(Debug, Default)]
pub struct NullExporter;

impl Exporter for NullExporter {
    fn export_day(&mut self, _result: &DayResult) -> OutputResult<()> {
        Ok(())
    }
}
