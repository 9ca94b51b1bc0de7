//! Augment command implementation.
//!
//! The augment command:
//! 1. Loads the trace
//! 2. Synthesizes staging rows
//! 3. Writes the augmented trace
//! 4. Writes the staging report (if requested)

use super::models::AugmentArgs;
use crate::output::{write_report, write_trace, StagingReport};
use crate::parser::{read_trace, TraceFormat};
use crate::staging::StagingSynthesizer;
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the augment command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Trace loading failures (missing columns, malformed content)
/// * Staging synthesis failures (invalid node counts, invalid config)
/// * File write errors
pub fn execute_augment(args: AugmentArgs) -> Result<StagingReport> {
    let start_time = Instant::now();

    info!("Starting staging synthesis for: {}", args.input.display());

    // Step 1: Load trace
    info!("Step 1/4: Loading trace...");
    let rows = read_trace(&args.input)
        .with_context(|| format!("Failed to load trace {}", args.input.display()))?;

    debug!("Loaded {} trace rows", rows.len());

    // Step 2: Synthesize staging rows
    info!("Step 2/4: Synthesizing staging rows...");
    let synthesizer = StagingSynthesizer::new(args.config.clone());
    let outcome = synthesizer
        .augment(rows)
        .context("Failed to synthesize staging rows")?;

    for (rule, count) in &outcome.rule_counts {
        debug!("  {}: {} rows", rule, count);
    }

    // Step 3: Write augmented trace
    info!("Step 3/4: Writing augmented trace...");
    write_trace(&outcome.rows, &args.output).context("Failed to write augmented trace")?;

    info!("✓ Augmented trace written to: {}", args.output.display());

    let report = StagingReport::from_outcome(
        &outcome,
        args.input.display().to_string(),
        synthesizer.config(),
    );

    // Step 4: Write report (if requested)
    if let Some(report_path) = &args.report {
        info!("Step 4/4: Writing staging report...");
        write_report(&report, report_path).context("Failed to write staging report")?;
        info!("✓ Report written to: {}", report_path.display());
    } else {
        info!("Step 4/4: Skipping staging report (not requested)");
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(60));
        println!("STAGING SUMMARY");
        println!("{}", "=".repeat(60));
        println!("{}", report.summary());
        println!("{}", "=".repeat(60));
    }

    let elapsed = start_time.elapsed();
    info!("Augment completed in {:.2}s", elapsed.as_secs_f64());

    Ok(report)
}

/// Validate augment arguments
///
/// **Public** - can be called before execute_augment for early validation
pub fn validate_args(args: &AugmentArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input trace path cannot be empty");
    }

    if !args.input.exists() {
        anyhow::bail!("Input trace not found: {}", args.input.display());
    }

    TraceFormat::from_path(&args.input).context("Unsupported input trace")?;
    TraceFormat::from_path(&args.output).context("Unsupported output trace")?;

    if args.input == args.output {
        anyhow::bail!("Output path must differ from the input trace");
    }

    args.config
        .validate()
        .context("Invalid staging configuration")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::StagingConfig;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const TRACE_CSV: &str = "\
taskName,taskPID,fileName,aggregateFilesizeMBtask,operation,stageOrder,numNodesList,prevTask
A,1,f1,10,1,0,[2],
B,2,f2,4,0,1,[1],A
";

    #[test]
    fn test_validate_args_missing_input() {
        let args = AugmentArgs {
            input: PathBuf::from("/nonexistent/trace.csv"),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_bad_output_extension() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("trace.csv");
        std::fs::write(&input, TRACE_CSV).unwrap();

        let args = AugmentArgs {
            input,
            output: dir.path().join("out.parquet"),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_same_paths() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("trace.csv");
        std::fs::write(&input, TRACE_CSV).unwrap();

        let args = AugmentArgs {
            input: input.clone(),
            output: input,
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_invalid_config() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("trace.csv");
        std::fs::write(&input, TRACE_CSV).unwrap();

        let args = AugmentArgs {
            input,
            output: dir.path().join("out.csv"),
            config: StagingConfig::default().with_max_parallelism(0),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_execute_augment() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("trace.csv");
        std::fs::write(&input, TRACE_CSV).unwrap();

        let args = AugmentArgs {
            input,
            output: dir.path().join("out/trace_staged.json"),
            report: Some(dir.path().join("out/report.json")),
            ..Default::default()
        };
        assert!(validate_args(&args).is_ok());

        let report = execute_augment(args.clone()).unwrap();
        assert_eq!(report.input_rows, 2);
        assert_eq!(report.staging_rows, 16);
        assert!(args.output.exists());
        assert!(args.report.unwrap().exists());
    }
}
