//! Output writers for augmented traces and staging reports.
//!
//! This module handles writing data to disk in various formats:
//! - JSON traces (array of row objects)
//! - CSV traces (union of all columns)
//! - JSON staging reports and text summaries

pub mod csv;
pub mod json;
pub mod report;

// Re-export main functions
pub use self::csv::{trace_columns, write_trace_csv};
pub use json::{trace_to_string, write_trace_json};
pub use report::{write_report, StagingReport};

use crate::parser::{AugmentedRow, TraceFormat};
use crate::utils::error::OutputError;
use log::debug;
use std::fs::File;
use std::path::Path;

/// Write an augmented trace, choosing the format by extension
///
/// **Public** - main entry point for trace output
///
/// # Errors
/// * `OutputError::InvalidPath` - Empty path, directory, or unsupported extension
/// * `OutputError::WriteFailed` - I/O error during write
pub fn write_trace(rows: &[AugmentedRow], output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    let format = TraceFormat::from_path(output_path)
        .map_err(|e| OutputError::InvalidPath(e.to_string()))?;

    match format {
        TraceFormat::Json => write_trace_json(rows, output_path),
        TraceFormat::Csv => write_trace_csv(rows, output_path),
    }
}

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Validate the path, create missing parent directories and open the file
fn create_output_file(path: &Path) -> Result<File, OutputError> {
    validate_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    File::create(path).map_err(OutputError::WriteFailed)
}

/// File size in bytes, 0 if unavailable
fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
