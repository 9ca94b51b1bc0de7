//! JSON trace writer.

use crate::parser::AugmentedRow;
use crate::utils::error::OutputError;
use log::info;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write an augmented trace as a pretty-printed JSON array
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_trace_json(
    rows: &[AugmentedRow],
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing {} rows to: {}", rows.len(), output_path.display());

    let file = super::create_output_file(output_path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, rows).map_err(OutputError::SerializationFailed)?;
    writer.flush()?;

    info!(
        "Trace written successfully ({} bytes)",
        super::file_size(output_path)
    );

    Ok(())
}

/// Serialize an augmented trace to a JSON string
pub fn trace_to_string(rows: &[AugmentedRow]) -> Result<String, OutputError> {
    serde_json::to_string_pretty(rows).map_err(OutputError::SerializationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{read_trace, TraceRow};
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read_back() {
        let rows = vec![AugmentedRow::Trace(
            TraceRow::new("A", "f1", 10.0, 1, 0.0).with_task_pid(7),
        )];
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.json");

        write_trace_json(&rows, &path).unwrap();
        let loaded = read_trace(&path).unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].task_name, "A");
        assert_eq!(loaded[0].task_pid_text(), "7");
        assert_eq!(loaded[0].aggregate_filesize_mb_task, 10.0);
    }

    #[test]
    fn test_trace_to_string_empty() {
        assert_eq!(trace_to_string(&[]).unwrap(), "[]");
    }
}
