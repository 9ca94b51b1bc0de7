use crate::utils::config::StagingConfig;
use std::path::PathBuf;

/// Arguments for the augment command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AugmentArgs {
    /// Input trace (JSON or CSV)
    pub input: PathBuf,

    /// Output path for the augmented trace (JSON or CSV)
    pub output: PathBuf,

    /// Optional output path for the JSON staging report
    pub report: Option<PathBuf>,

    /// Synthesis configuration
    pub config: StagingConfig,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for AugmentArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("trace.csv"),
            output: PathBuf::from("trace_staged.csv"),
            report: None,
            config: StagingConfig::default(),
            print_summary: false,
        }
    }
}
