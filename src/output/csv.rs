//! CSV tabular sink.
//!
//! Writes one `table/{stem}.csv` per non-empty day. Entries are opaque field
//! maps, so the header is the union of fields across the day's entries in
//! first-seen order; entries missing a field get an empty cell.

use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

use super::{Exporter, OutputError, OutputResult};
use crate::DayResult;

/// Subdirectory for tabular exports.
const TABLE_DIR: &str = "table";

/// CSV exporter writing one file per day under `<root>/table/`.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    root: PathBuf,
}

impl CsvExporter {
    /// Create an exporter rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Path of the table file for a day.
    pub fn table_path(&self, result: &DayResult) -> PathBuf {
        self.root
            .join(TABLE_DIR)
            .join(format!("{}.csv", result.key.file_stem()))
    }

    fn render_cell(value: Option<&Value>) -> String {
        match value {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

impl Exporter for CsvExporter {
    fn export_day(&mut self, result: &DayResult) -> OutputResult<()> {
        if result.entries.is_empty() {
            info!(date = %result.key.date, "no records to write a table for");
            return Ok(());
        }

        let path = self.table_path(result);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::Io(format!("failed to create directory: {e}")))?;
        }
        let file = File::create(&path)
            .map_err(|e| OutputError::Io(format!("failed to create {}: {e}", path.display())))?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));

        // Union of fields in first-seen order.
        let mut columns: Vec<String> = Vec::new();
        for entry in &result.entries {
            for field in entry.0.keys() {
                if !columns.iter().any(|c| c == field) {
                    columns.push(field.clone());
                }
            }
        }

        writer
            .write_record(&columns)
            .map_err(|e| OutputError::Csv(format!("failed to write header: {e}")))?;
        for entry in &result.entries {
            let row: Vec<String> = columns
                .iter()
                .map(|c| Self::render_cell(entry.0.get(c)))
                .collect();
            writer
                .write_record(&row)
                .map_err(|e| OutputError::Csv(format!("failed to write row: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| OutputError::Io(format!("failed to flush {}: {e}", path.display())))?;

        info!(
            path = %path.display(),
            rows = result.entries.len(),
            "entries written to table"
        );
        Ok(())
    }
}
