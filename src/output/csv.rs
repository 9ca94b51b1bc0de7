//! CSV trace writer.
//!
//! Original and staging rows carry different columns; the header is the
//! union of both. Known columns come first in trace order, any pass-through
//! columns follow alphabetically.

use crate::parser::AugmentedRow;
use crate::utils::error::OutputError;
use log::info;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

/// Column order of the workflow trace format
const KNOWN_COLUMNS: &[&str] = &[
    "operation",
    "randomOffset",
    "transferSize",
    "aggregateFilesizeMB",
    "numTasks",
    "parallelism",
    "totalTime",
    "numNodesList",
    "numNodes",
    "tasksPerNode",
    "trMiB",
    "storageType",
    "opCount",
    "taskName",
    "taskPID",
    "fileName",
    "stageOrder",
    "prevTask",
    "aggregateFilesizeMBtask",
];

/// Write an augmented trace as CSV
pub fn write_trace_csv(
    rows: &[AugmentedRow],
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing {} rows to: {}", rows.len(), output_path.display());

    let file = super::create_output_file(output_path)?;
    write_csv(rows, file)?;

    info!(
        "Trace written successfully ({} bytes)",
        super::file_size(output_path)
    );
    Ok(())
}

/// Write an augmented trace as CSV to any writer
pub fn write_csv<W: Write>(rows: &[AugmentedRow], writer: W) -> Result<(), OutputError> {
    let records = rows
        .iter()
        .map(to_object)
        .collect::<Result<Vec<_>, _>>()?;
    let columns = trace_columns(&records);

    let mut csv_writer = csv::Writer::from_writer(writer);
    if columns.is_empty() {
        csv_writer.flush()?;
        return Ok(());
    }

    csv_writer.write_record(&columns)?;
    for record in &records {
        csv_writer.write_record(
            columns
                .iter()
                .map(|column| record.get(column).map(cell_text).unwrap_or_default()),
        )?;
    }
    csv_writer.flush()?;

    Ok(())
}

/// Header for a set of records: known columns present, then the rest sorted
pub fn trace_columns(records: &[Map<String, Value>]) -> Vec<String> {
    let present: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.keys().map(String::as_str))
        .collect();

    let known = KNOWN_COLUMNS
        .iter()
        .filter(|column| present.contains(*column))
        .map(|column| column.to_string());
    let extra = present
        .iter()
        .filter(|column| !KNOWN_COLUMNS.contains(*column))
        .map(|column| column.to_string());

    known.chain(extra).collect()
}

fn to_object(row: &AugmentedRow) -> Result<Map<String, Value>, OutputError> {
    match serde_json::to_value(row)? {
        Value::Object(object) => Ok(object),
        other => Ok(Map::from_iter([("value".to_string(), other)])),
    }
}

/// Render a cell; lists use the bracketed form read back by the node-list parser
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(cell_text).collect::<Vec<_>>().join(", ")
        ),
        other => other.to_string(),
    }
}
