use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;
use workflow_staging::commands::{execute_augment, validate_args, AugmentArgs};
use workflow_staging::output::{write_trace, StagingReport};
use workflow_staging::parser::{read_trace, AugmentedRow, NodeListField, TraceRow};
use workflow_staging::staging::{is_staged, StagingSynthesizer};
use workflow_staging::utils::config::StagingConfig;

fn sample_trace() -> Vec<TraceRow> {
    vec![
        TraceRow::new("align", "reads.fq", 8.0, 1, 0.0)
            .with_task_pid(1)
            .with_num_nodes(NodeListField::List(vec![1, 2])),
        TraceRow::new("align", "aligned.bam", 2.0, 0, 0.0).with_task_pid(1),
        TraceRow::new("merge", "aligned.bam", 2.0, 1, 1.0)
            .with_task_pid(2)
            .with_prev_task("align"),
    ]
}

#[test]
fn test_csv_round_trip_keeps_staging_columns() {
    let outcome = StagingSynthesizer::default().augment(sample_trace()).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("augmented.csv");
    write_trace(&outcome.rows, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("operation,"));
    assert!(header.contains("storageType"));
    assert!(header.contains("aggregateFilesizeMBtask"));

    let reloaded = read_trace(&path).unwrap();
    assert_eq!(reloaded.len(), outcome.rows.len());

    let stage_in = reloaded
        .iter()
        .find(|row| row.task_name == "stage_in-0")
        .unwrap();
    assert_eq!(stage_in.stage_order, -1.0);
    assert_eq!(stage_in.operation_code(), "cp");
    assert_eq!(stage_in.extra["storageType"], "beegfs-tmpfs");

    let original = reloaded.iter().filter(|row| !is_staged(&row.task_name)).count();
    assert_eq!(original, 3);
}

#[test]
fn test_write_rejects_unknown_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("augmented.txt");
    assert!(write_trace(&[], &path).is_err());
}

#[test]
fn test_augment_command_end_to_end() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("trace.json");
    let output = dir.path().join("out").join("augmented.json");
    let report_path = dir.path().join("out").join("report.json");
    let original: Vec<AugmentedRow> = sample_trace().into_iter().map(AugmentedRow::Trace).collect();
    write_trace(&original, &input).unwrap();

    let args = AugmentArgs {
        input,
        output: output.clone(),
        report: Some(report_path.clone()),
        config: StagingConfig::default(),
        print_summary: false,
    };
    validate_args(&args).unwrap();
    let report = execute_augment(args).unwrap();

    assert_eq!(report.input_rows, 3);
    assert_eq!(report.output_rows, report.input_rows + report.staging_rows);
    assert_eq!(
        report.rows_per_rule.values().sum::<usize>(),
        report.staging_rows
    );

    let written: StagingReport =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written.rows_per_rule, report.rows_per_rule);
    assert_eq!(read_trace(&output).unwrap().len(), report.output_rows);
}
