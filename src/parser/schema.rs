//! Record definitions for original and synthesized trace rows.
//!
//! Column names follow the workflow trace convention (camelCase), so a row
//! written by this crate can be read back by the simulator unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One record of the original workflow trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    #[serde(rename = "taskName", default, deserialize_with = "lenient_string")]
    pub task_name: String,

    /// Opaque task identifier, kept exactly as it appeared in the input
    #[serde(rename = "taskPID", default)]
    pub task_pid: Value,

    #[serde(rename = "fileName", default, deserialize_with = "lenient_string")]
    pub file_name: String,

    /// MB attributed to this file for this task (absent = 0)
    #[serde(
        rename = "aggregateFilesizeMBtask",
        default,
        deserialize_with = "lenient_f64_or_zero"
    )]
    pub aggregate_filesize_mb_task: f64,

    /// Raw operation code, classified by an [`OperationClassifier`](super::OperationClassifier)
    #[serde(default)]
    pub operation: Value,

    #[serde(rename = "stageOrder", deserialize_with = "lenient_f64")]
    pub stage_order: f64,

    #[serde(
        rename = "numNodesList",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub num_nodes_list: Option<NodeListField>,

    #[serde(
        rename = "prevTask",
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub prev_task: Option<String>,

    /// Columns this crate does not interpret, carried through to the output
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TraceRow {
    /// Minimal row with the load-bearing columns set
    pub fn new(
        task_name: impl Into<String>,
        file_name: impl Into<String>,
        size_mb: f64,
        operation: impl Into<Value>,
        stage_order: f64,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            task_pid: Value::Null,
            file_name: file_name.into(),
            aggregate_filesize_mb_task: size_mb,
            operation: operation.into(),
            stage_order,
            num_nodes_list: None,
            prev_task: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_task_pid(mut self, pid: impl Into<Value>) -> Self {
        self.task_pid = pid.into();
        self
    }

    pub fn with_num_nodes(mut self, nodes: NodeListField) -> Self {
        self.num_nodes_list = Some(nodes);
        self
    }

    pub fn with_prev_task(mut self, prev: impl Into<String>) -> Self {
        self.prev_task = Some(prev.into());
        self
    }

    /// Operation code as text, for classification
    pub fn operation_code(&self) -> String {
        value_to_text(&self.operation)
    }

    /// Task identifier as text (empty when absent)
    pub fn task_pid_text(&self) -> String {
        value_to_text(&self.task_pid)
    }
}

/// The `numNodesList` column as it arrives on input
///
/// Legacy traces store the list as text (`"[1, 2]"`), newer ones as a native
/// list. [`resolve_node_counts`](super::resolve_node_counts) normalizes all forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeListField {
    List(Vec<i64>),
    /// List with float or text elements (`[2.0, 4.0]`, `["2"]`)
    Values(Vec<Value>),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Copy primitive used by a staging row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyOp {
    /// Cross-tier copy
    Cp,
    /// Copy between two nodes of the same tier class
    Scp,
}

/// Source-destination storage tier pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StorageType {
    #[serde(rename = "beegfs-tmpfs")]
    BeegfsTmpfs,
    #[serde(rename = "beegfs-ssd")]
    BeegfsSsd,
    #[serde(rename = "ssd-ssd")]
    SsdSsd,
    #[serde(rename = "tmpfs-tmpfs")]
    TmpfsTmpfs,
    #[serde(rename = "tmpfs-beegfs")]
    TmpfsBeegfs,
    #[serde(rename = "ssd-beegfs")]
    SsdBeegfs,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::BeegfsTmpfs => "beegfs-tmpfs",
            StorageType::BeegfsSsd => "beegfs-ssd",
            StorageType::SsdSsd => "ssd-ssd",
            StorageType::TmpfsTmpfs => "tmpfs-tmpfs",
            StorageType::TmpfsBeegfs => "tmpfs-beegfs",
            StorageType::SsdBeegfs => "ssd-beegfs",
        }
    }

    /// `scp` for same-class node-local copies, `cp` otherwise
    pub fn copy_op(&self) -> CopyOp {
        match self {
            StorageType::SsdSsd | StorageType::TmpfsTmpfs => CopyOp::Scp,
            _ => CopyOp::Cp,
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One synthesized bulk copy between two storage tiers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagingRow {
    pub operation: CopyOp,
    pub random_offset: u64,
    pub transfer_size: u64,
    #[serde(rename = "aggregateFilesizeMB")]
    pub aggregate_filesize_mb: f64,
    pub num_tasks: usize,
    pub parallelism: usize,
    /// Always unset; durations are modeled downstream
    pub total_time: Option<f64>,
    pub num_nodes_list: Vec<u32>,
    pub num_nodes: u32,
    pub tasks_per_node: usize,
    #[serde(rename = "trMiB")]
    pub tr_mib: Option<f64>,
    pub storage_type: StorageType,
    pub op_count: usize,
    pub task_name: String,
    #[serde(rename = "taskPID")]
    pub task_pid: String,
    pub file_name: String,
    pub stage_order: f64,
    pub prev_task: String,
}

/// A row of the augmented trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AugmentedRow {
    Trace(TraceRow),
    Staging(StagingRow),
}

impl AugmentedRow {
    pub fn stage_order(&self) -> f64 {
        match self {
            AugmentedRow::Trace(row) => row.stage_order,
            AugmentedRow::Staging(row) => row.stage_order,
        }
    }

    pub fn task_name(&self) -> &str {
        match self {
            AugmentedRow::Trace(row) => &row.task_name,
            AugmentedRow::Staging(row) => &row.task_name,
        }
    }

    pub fn as_staging(&self) -> Option<&StagingRow> {
        match self {
            AugmentedRow::Staging(row) => Some(row),
            AugmentedRow::Trace(_) => None,
        }
    }

    pub fn is_staging(&self) -> bool {
        matches!(self, AugmentedRow::Staging(_))
    }
}

/// Render a scalar cell as text; null becomes the empty string
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(value_to_text(&other)),
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a number, found {}", value)))
}

fn lenient_f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(0.0);
    }
    number_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a number, found {}", value)))
}

/// Accept JSON numbers and numeric strings (CSV cells arrive as text)
fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trace_row_from_json_numbers() {
        let row: TraceRow = serde_json::from_value(json!({
            "taskName": "align",
            "taskPID": 4242,
            "fileName": "chunk_0.fa",
            "aggregateFilesizeMBtask": 12.5,
            "operation": 1,
            "stageOrder": 2,
            "numNodesList": [1, 2],
            "prevTask": "split",
            "totalTime": 3.2
        }))
        .unwrap();

        assert_eq!(row.task_name, "align");
        assert_eq!(row.task_pid_text(), "4242");
        assert_eq!(row.stage_order, 2.0);
        assert_eq!(row.operation_code(), "1");
        assert_eq!(row.num_nodes_list, Some(NodeListField::List(vec![1, 2])));
        assert_eq!(row.prev_task.as_deref(), Some("split"));
        assert_eq!(row.extra.get("totalTime"), Some(&json!(3.2)));
    }

    #[test]
    fn test_trace_row_from_text_cells() {
        let row: TraceRow = serde_json::from_value(json!({
            "taskName": "align",
            "taskPID": "77",
            "fileName": "out.h5",
            "aggregateFilesizeMBtask": "0.25",
            "operation": "write",
            "stageOrder": "1",
            "numNodesList": "[4]"
        }))
        .unwrap();

        assert_eq!(row.aggregate_filesize_mb_task, 0.25);
        assert_eq!(row.stage_order, 1.0);
        assert_eq!(row.num_nodes_list, Some(NodeListField::Text("[4]".to_string())));
        assert!(row.prev_task.is_none());
    }

    #[test]
    fn test_trace_row_rejects_non_numeric_stage_order() {
        let result = serde_json::from_value::<TraceRow>(json!({
            "taskName": "a",
            "stageOrder": "first"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_size_defaults_to_zero() {
        let row: TraceRow = serde_json::from_value(json!({
            "taskName": "stage_out-a",
            "stageOrder": 0.5,
            "aggregateFilesizeMBtask": null
        }))
        .unwrap();
        assert_eq!(row.aggregate_filesize_mb_task, 0.0);
    }

    #[test]
    fn test_storage_type_copy_op() {
        assert_eq!(StorageType::SsdSsd.copy_op(), CopyOp::Scp);
        assert_eq!(StorageType::TmpfsTmpfs.copy_op(), CopyOp::Scp);
        assert_eq!(StorageType::BeegfsSsd.copy_op(), CopyOp::Cp);
        assert_eq!(StorageType::SsdBeegfs.copy_op(), CopyOp::Cp);
        assert_eq!(
            serde_json::to_value(StorageType::TmpfsBeegfs).unwrap(),
            json!("tmpfs-beegfs")
        );
    }
}
