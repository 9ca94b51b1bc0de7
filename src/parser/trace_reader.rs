//! Load workflow traces from JSON or CSV.
//!
//! Both formats are funneled through the same JSON object representation
//! before deserializing into [`TraceRow`], so column handling is identical.

use super::schema::TraceRow;
use crate::utils::config::REQUIRED_COLUMNS;
use crate::utils::error::ParseError;
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Supported tabular encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    /// Array of row objects
    Json,
    /// Header row followed by records
    Csv,
}

impl TraceFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(TraceFormat::Json),
            Some("csv") => Ok(TraceFormat::Csv),
            _ => Err(ParseError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read a trace file, choosing the format by extension
///
/// **Public** - main entry point for trace loading
///
/// # Errors
/// * `ParseError::UnsupportedFormat` - Extension is neither .json nor .csv
/// * `ParseError::MissingColumn` - A required column is absent
/// * `ParseError::JsonError` / `ParseError::CsvError` - Malformed content
pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<TraceRow>, ParseError> {
    let path = path.as_ref();
    let format = TraceFormat::from_path(path)?;

    info!("Reading {:?} trace from: {}", format, path.display());

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let rows = match format {
        TraceFormat::Json => {
            let value: Value = serde_json::from_reader(reader)?;
            parse_trace_json(&value)?
        }
        TraceFormat::Csv => parse_trace_csv(reader)?,
    };

    debug!("Loaded {} trace rows", rows.len());
    Ok(rows)
}

/// Parse a trace from a JSON array of row objects
pub fn parse_trace_json(value: &Value) -> Result<Vec<TraceRow>, ParseError> {
    let records = value.as_array().ok_or_else(|| {
        ParseError::InvalidFormat("Trace must be a JSON array of row objects".to_string())
    })?;

    let mut objects = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let object = record.as_object().ok_or_else(|| {
            ParseError::InvalidFormat(format!("Row {} is not a JSON object", index))
        })?;
        objects.push(object.clone());
    }

    // Staging rows written by a previous run lack some compute columns, so
    // presence is checked over the whole table rather than per row.
    let mut seen: HashSet<&str> = HashSet::new();
    for object in &objects {
        seen.extend(object.keys().map(String::as_str));
    }
    if !objects.is_empty() {
        check_required_columns(|column| seen.contains(column))?;
    }

    rows_from_objects(objects)
}

/// Parse a trace from CSV with a header row
///
/// Cells are kept as text; numeric columns are converted during
/// deserialization. Empty cells are treated as absent.
pub fn parse_trace_csv<R: Read>(reader: R) -> Result<Vec<TraceRow>, ParseError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    check_required_columns(|column| headers.iter().any(|h| h == column))?;

    let mut objects = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut object = Map::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if cell.is_empty() {
                continue;
            }
            object.insert(header.to_string(), Value::String(cell.to_string()));
        }
        objects.push(object);
    }

    rows_from_objects(objects)
}

fn check_required_columns(has_column: impl Fn(&str) -> bool) -> Result<(), ParseError> {
    match REQUIRED_COLUMNS.iter().find(|column| !has_column(column)) {
        Some(missing) => Err(ParseError::MissingColumn((*missing).to_string())),
        None => Ok(()),
    }
}

fn rows_from_objects(objects: Vec<Map<String, Value>>) -> Result<Vec<TraceRow>, ParseError> {
    objects
        .into_iter()
        .enumerate()
        .map(|(index, object)| {
            // stageOrder drives every rule and the final ordering
            if object.get("stageOrder").map_or(true, Value::is_null) {
                return Err(ParseError::MissingColumn(format!(
                    "stageOrder (row {})",
                    index
                )));
            }
            serde_json::from_value::<TraceRow>(Value::Object(object)).map_err(|e| {
                ParseError::InvalidFormat(format!("Row {}: {}", index, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            TraceFormat::from_path(Path::new("trace.JSON")).unwrap(),
            TraceFormat::Json
        );
        assert_eq!(
            TraceFormat::from_path(Path::new("a/b/trace.csv")).unwrap(),
            TraceFormat::Csv
        );
        assert!(matches!(
            TraceFormat::from_path(Path::new("trace.parquet")),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parse_json_requires_columns() {
        let trace = json!([
            {"taskName": "a", "fileName": "f", "operation": 1, "stageOrder": 0}
        ]);
        match parse_trace_json(&trace) {
            Err(ParseError::MissingColumn(column)) => assert_eq!(column, "taskPID"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_json_empty_array() {
        let rows = parse_trace_json(&json!([])).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_json_not_array() {
        assert!(matches!(
            parse_trace_json(&json!({"rows": []})),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_csv() {
        let data = "\
taskName,taskPID,fileName,aggregateFilesizeMBtask,operation,stageOrder,numNodesList,prevTask
split,11,in.fa,10.5,1,0,\"[1, 2]\",
align,12,chunk.fa,2,0,1,[4],split
";
        let rows = parse_trace_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].aggregate_filesize_mb_task, 10.5);
        assert_eq!(rows[0].prev_task, None);
        assert_eq!(rows[1].prev_task.as_deref(), Some("split"));
        assert_eq!(rows[1].stage_order, 1.0);
        assert_eq!(rows[1].task_pid_text(), "12");
    }

    #[test]
    fn test_parse_csv_missing_stage_order_column() {
        let data = "taskName,taskPID,fileName,aggregateFilesizeMBtask,operation\na,1,f,1,1\n";
        match parse_trace_csv(data.as_bytes()) {
            Err(ParseError::MissingColumn(column)) => assert_eq!(column, "stageOrder"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_csv_empty_stage_order_cell() {
        let data = "\
taskName,taskPID,fileName,aggregateFilesizeMBtask,operation,stageOrder
a,1,f,1,1,
";
        assert!(matches!(
            parse_trace_csv(data.as_bytes()),
            Err(ParseError::MissingColumn(_))
        ));
    }
}
