//! Output formatting for the scan report.
//!
//! Text mode prints timestamped progress lines and an aligned table; JSON
//! mode prints a single document and nothing else on stdout.

use anyhow::Result;
use chrono::Local;
use rootscan_core::{Cid, ObjectInfo, ScanReport, Stage};
use serde::Serialize;
use std::io::{self, Write};

/// Minimum width of a padded table column.
const MIN_CELL_WIDTH: usize = 8;

/// Spaces added after the widest cell of a column.
const CELL_PADDING: usize = 4;

/// Table header.
const HEADER: [&str; 4] = ["Hash", "Type", "Size", "Pinned(recursively)"];

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writer for command output with format abstraction.
pub struct OutputWriter {
    format: OutputFormat,
    stdout: io::Stdout,
}

impl OutputWriter {
    /// Create a new OutputWriter.
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            stdout: io::stdout(),
        }
    }

    /// Print a timestamped progress line (text mode only).
    pub fn progress(&self, stage: Stage) {
        if self.format == OutputFormat::Text {
            let _ = writeln!(&self.stdout, "{}: {}", Local::now(), stage);
        }
    }

    /// Write output using the configured format.
    ///
    /// The `text_fn` closure is called only in text mode to generate the
    /// human-readable output.
    pub fn write<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                writeln!(&self.stdout, "{}", json)?;
            }
            OutputFormat::Text => {
                let text = text_fn();
                if !text.is_empty() {
                    write!(&self.stdout, "{}", text)?;
                }
            }
        }
        Ok(())
    }

    /// Write an error message to stderr.
    ///
    /// In JSON mode, writes a JSON error object with success=false.
    /// In text mode, writes the error message directly.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        match self.format {
            OutputFormat::Json => {
                let error_output = ErrorOutput {
                    success: false,
                    result_code,
                    error: format!("{:#}", error),
                };
                if let Ok(json) = serde_json::to_string_pretty(&error_output) {
                    let _ = writeln!(io::stderr(), "{}", json);
                }
            }
            OutputFormat::Text => {
                let _ = writeln!(io::stderr(), "Error: {:#}", error);
            }
        }
    }
}

/// Error output structure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// Output of a scan.
#[derive(Debug, Serialize)]
pub struct ScanOutput {
    pub success: bool,
    pub result_code: u8,
    pub stored: usize,
    pub pins: usize,
    pub unresolved: Vec<Cid>,
    pub objects: Vec<ObjectInfo>,
}

impl From<ScanReport> for ScanOutput {
    fn from(report: ScanReport) -> Self {
        Self {
            success: true,
            result_code: 0,
            stored: report.stored,
            pins: report.pins,
            unresolved: report.unresolved,
            objects: report.objects,
        }
    }
}

/// Render report rows as a table with space-aligned columns.
///
/// Every column but the last is padded to the widest cell plus
/// [`CELL_PADDING`], and never narrower than [`MIN_CELL_WIDTH`].
pub fn render_table(objects: &[ObjectInfo]) -> String {
    let mut rows: Vec<[String; 4]> = Vec::with_capacity(objects.len() + 1);
    rows.push(HEADER.map(String::from));
    rows.extend(objects.iter().map(|o| {
        [
            o.cid.to_hex(),
            o.type_tag.to_string(),
            o.total_size.to_string(),
            o.pinned.to_string(),
        ]
    }));

    let mut widths = [0usize; 3];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count() + CELL_PADDING);
        }
    }
    for width in &mut widths {
        *width = (*width).max(MIN_CELL_WIDTH);
    }

    let mut out = String::new();
    for row in &rows {
        for (cell, width) in row.iter().zip(widths) {
            out.push_str(&format!("{:<width$}", cell, width = width));
        }
        out.push_str(&row[3]);
        out.push('\n');
    }
    out
}
