//! Workflow Staging CLI
//!
//! Inserts synthesized data-staging rows into workflow I/O traces.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use workflow_staging::commands::{
    display_config, display_validation, display_version, execute_augment, validate_args,
    AugmentArgs,
};
use workflow_staging::utils::config::{load_config, StagingConfig};

/// Workflow Staging - data-staging synthesis for workflow I/O traces
#[derive(Parser, Debug)]
#[command(name = "wf-staging")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert staging rows into a trace
    Augment {
        /// Input trace (.json or .csv)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the augmented trace (.json or .csv)
        #[arg(short, long)]
        output: PathBuf,

        /// Staging configuration file (TOML)
        #[arg(short, long, env = "WF_STAGING_CONFIG")]
        config: Option<PathBuf>,

        /// Output path for the JSON staging report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Maximum files per staging row (overrides config)
        #[arg(long)]
        max_parallelism: Option<usize>,

        /// Filesystem block size in bytes (overrides config)
        #[arg(long)]
        block_size: Option<u64>,

        /// Trace every staging decision
        #[arg(long)]
        debug: bool,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a trace file
    Validate {
        /// Path to trace file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the effective staging configuration
    Config {
        /// Staging configuration file (TOML)
        #[arg(short, long, env = "WF_STAGING_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    // Staging events are logged at debug level, so --debug implies it
    let staging_debug = matches!(cli.command, Commands::Augment { debug: true, .. });
    let log_level = if cli.verbose || staging_debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Augment {
            input,
            output,
            config,
            report,
            max_parallelism,
            block_size,
            debug,
            summary,
        } => {
            let mut staging_config = resolve_config(config.as_ref())?;

            if let Some(max_parallelism) = max_parallelism {
                staging_config = staging_config.with_max_parallelism(max_parallelism);
            }
            if let Some(block_size) = block_size {
                staging_config = staging_config.with_fs_block_size(block_size);
            }
            if debug {
                staging_config = staging_config.with_debug(true);
            }

            let args = AugmentArgs {
                input,
                output,
                report,
                config: staging_config,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_augment(args)?;
        }

        Commands::Validate { file } => {
            display_validation(&file)?;
        }

        Commands::Config { config } => {
            display_config(&resolve_config(config.as_ref())?)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Load the config file if given, defaults otherwise
fn resolve_config(path: Option<&PathBuf>) -> Result<StagingConfig> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(StagingConfig::default()),
    }
}
