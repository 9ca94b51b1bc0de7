//! Configuration and constants for staging synthesis.

use super::error::{ConfigError, StagingError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Filesystem block size written as `transferSize` on staging rows
pub const DEFAULT_FS_BLOCK_SIZE: u64 = 4096;

/// Maximum number of files moved by one staging row
pub const DEFAULT_MAX_PARALLELISM: usize = 60;

pub const DEFAULT_FILE_NAME_DELIMITER: &str = ",";

// Columns every input trace must carry. `numNodesList` and `prevTask` are optional.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "taskName",
    "taskPID",
    "fileName",
    "aggregateFilesizeMBtask",
    "operation",
    "stageOrder",
];

/// Markers identifying rows that are themselves staging rows
pub const STAGE_IN_MARKER: &str = "stage_in";
pub const STAGE_OUT_MARKER: &str = "stage_out";

/// Tunables owned by the staging synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Block size (bytes) reported as `transferSize`
    pub fs_block_size: u64,

    /// Upper bound on files per staging row
    pub max_parallelism: usize,

    /// Separator used when joining a batch's file names
    pub file_name_delimiter: String,

    /// Emit verbose staging events
    pub debug: bool,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            fs_block_size: DEFAULT_FS_BLOCK_SIZE,
            max_parallelism: DEFAULT_MAX_PARALLELISM,
            file_name_delimiter: DEFAULT_FILE_NAME_DELIMITER.to_string(),
            debug: false,
        }
    }
}

impl StagingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    pub fn with_fs_block_size(mut self, fs_block_size: u64) -> Self {
        self.fs_block_size = fs_block_size;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Reject configurations the synthesizer cannot honor
    pub fn validate(&self) -> Result<(), StagingError> {
        if self.max_parallelism == 0 {
            return Err(StagingError::InvalidConfig(
                "max_parallelism must be greater than 0".to_string(),
            ));
        }
        if self.fs_block_size == 0 {
            return Err(StagingError::InvalidConfig(
                "fs_block_size must be greater than 0".to_string(),
            ));
        }
        if self.file_name_delimiter.is_empty() {
            return Err(StagingError::InvalidConfig(
                "file_name_delimiter cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Render as TOML (used by the `config` command)
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Load a staging configuration from a TOML file
///
/// Missing keys fall back to their defaults.
///
/// # Errors
/// * `ConfigError::IoError` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid
/// * `ConfigError::Invalid` - If values are out of range
pub fn load_config(path: impl AsRef<Path>) -> Result<StagingConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading staging config from: {}", path.display());

    let contents = std::fs::read_to_string(path)?;
    let config: StagingConfig = toml::from_str(&contents)?;
    config.validate()?;

    Ok(config)
}
