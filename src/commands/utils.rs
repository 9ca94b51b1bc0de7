use crate::parser::read_trace;
use crate::staging::{is_staged, validate_rows};
use crate::utils::config::{StagingConfig, SCHEMA_VERSION};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Statistics of a validated trace
#[derive(Debug, Clone, PartialEq)]
pub struct TraceStats {
    pub rows: usize,
    pub tasks: usize,
    pub staging_tasks: usize,
    /// Rows per integer stage (staging stages are reported as-is)
    pub rows_per_stage: BTreeMap<String, usize>,
}

/// Load and validate a trace file, returning its statistics
pub fn validate_trace_file(file_path: &Path) -> Result<TraceStats> {
    let rows = read_trace(file_path)
        .with_context(|| format!("Failed to load trace {}", file_path.display()))?;
    validate_rows(&rows).context("Trace failed validation")?;

    let tasks: BTreeSet<&str> = rows.iter().map(|r| r.task_name.as_str()).collect();
    let mut rows_per_stage: BTreeMap<String, usize> = BTreeMap::new();
    for row in &rows {
        *rows_per_stage.entry(row.stage_order.to_string()).or_insert(0) += 1;
    }

    Ok(TraceStats {
        rows: rows.len(),
        tasks: tasks.len(),
        staging_tasks: tasks.iter().filter(|t| is_staged(t)).count(),
        rows_per_stage,
    })
}

/// Print validation results for a trace file
pub fn display_validation(file_path: &Path) -> Result<()> {
    println!("Validating trace: {}", file_path.display());

    let stats = validate_trace_file(file_path)?;

    println!("✓ Valid trace");
    println!("  Rows: {}", stats.rows);
    println!("  Tasks: {}", stats.tasks);
    println!("  Staging tasks: {}", stats.staging_tasks);
    println!("  Rows per stage:");
    for (stage, count) in &stats.rows_per_stage {
        println!("    {:>6}: {}", stage, count);
    }

    Ok(())
}

/// Print the effective staging configuration as TOML
pub fn display_config(config: &StagingConfig) -> Result<()> {
    let rendered = config.to_toml().context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("Workflow Staging v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Synthesizes data-staging rows for multi-stage workflow I/O traces.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_trace_file_stats() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.json");
        std::fs::write(
            &path,
            r#"[
                {"taskName": "A", "taskPID": 1, "fileName": "f", "aggregateFilesizeMBtask": 1, "operation": 1, "stageOrder": 0},
                {"taskName": "stage_in-B", "taskPID": "", "fileName": "g", "aggregateFilesizeMBtask": 1, "operation": "cp", "stageOrder": 0.5},
                {"taskName": "B", "taskPID": 2, "fileName": "g", "aggregateFilesizeMBtask": 1, "operation": 0, "stageOrder": 1}
            ]"#,
        )
        .unwrap();

        let stats = validate_trace_file(&path).unwrap();
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.tasks, 3);
        assert_eq!(stats.staging_tasks, 1);
        assert_eq!(stats.rows_per_stage["0.5"], 1);
        assert_eq!(stats.rows_per_stage["1"], 1);
    }

    #[test]
    fn test_validate_rejects_negative_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.json");
        std::fs::write(
            &path,
            r#"[{"taskName": "A", "taskPID": 1, "fileName": "f", "aggregateFilesizeMBtask": -1, "operation": 1, "stageOrder": 0}]"#,
        )
        .unwrap();

        assert!(validate_trace_file(&path).is_err());
    }
}
