//! Staging report: what each rule contributed to an augmented trace.

use crate::staging::StagingOutcome;
use crate::utils::config::{StagingConfig, SCHEMA_VERSION};
use crate::utils::error::OutputError;
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufWriter;
use std::path::Path;

/// Summary of one staging run, written next to the augmented trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Trace the report was generated from
    pub source: String,

    pub input_rows: usize,
    pub staging_rows: usize,
    pub output_rows: usize,

    /// Staging rows per rule name
    pub rows_per_rule: BTreeMap<String, usize>,

    /// Configuration the rows were synthesized with
    pub config: StagingConfig,

    /// Timestamp when the report was generated
    pub generated_at: String,
}

impl StagingReport {
    pub fn from_outcome(
        outcome: &StagingOutcome,
        source: impl Into<String>,
        config: &StagingConfig,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            source: source.into(),
            input_rows: outcome.input_rows,
            staging_rows: outcome.staging_rows(),
            output_rows: outcome.rows.len(),
            rows_per_rule: outcome
                .rule_counts
                .iter()
                .map(|(rule, count)| (rule.name().to_string(), *count))
                .collect(),
            config: config.clone(),
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Source:        {}", self.source),
            format!("Input rows:    {}", self.input_rows),
            format!("Staging rows:  {}", self.staging_rows),
            format!("Output rows:   {}", self.output_rows),
            "Rows per rule:".to_string(),
        ];
        for (rule, count) in &self.rows_per_rule {
            lines.push(format!("  {:<28}{}", rule, count));
        }
        lines.join("\n")
    }
}

/// Write a staging report as pretty-printed JSON
pub fn write_report(report: &StagingReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing staging report to: {}", output_path.display());

    let file = super::create_output_file(output_path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .map_err(OutputError::SerializationFailed)?;

    Ok(())
}
