//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::staging::StageRule;
use thiserror::Error;

/// Errors that can occur while loading a trace
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read trace file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV parsing failed: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported trace format: {0} (expected .json or .csv)")]
    UnsupportedFormat(String),
}

/// Errors that abort staging synthesis
///
/// Every variant names the phase (or rule) that could not proceed, so the
/// caller never receives a partially augmented trace.
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Invalid staging configuration: {0}")]
    InvalidConfig(String),

    #[error("validate: row {row} (task '{task}') has non-finite stageOrder {value}")]
    InvalidStageOrder { row: usize, task: String, value: f64 },

    #[error("validate: row {row} (file '{file}') has invalid aggregateFilesizeMBtask {value}")]
    InvalidFileSize { row: usize, file: String, value: f64 },

    #[error("{rule}: task '{task}' has node count {value}, node counts must be positive")]
    InvalidNodeCount {
        rule: StageRule,
        task: String,
        value: i64,
    },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Failed to write CSV: {0}")]
    CsvFailed(#[from] csv::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur while loading a staging configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Failed to render config TOML: {0}")]
    RenderFailed(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] StagingError),
}
