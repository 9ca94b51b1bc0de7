//! Staging synthesis driver.
//!
//! Runs validation, the four staging rules and the combiner over one trace.
//! The transform is a pure function of the trace, the classifier and the
//! configuration; it either returns the complete augmented trace or an error.

use super::combiner::combine;
use super::events::{EventSink, LogSink, NullSink, StagingEvent};
use super::row_factory::RowFactory;
use super::rules::{RuleContext, StageRule};
use crate::parser::{AugmentedRow, OperationClassifier, StagingRow, StandardClassifier, TraceRow};
use crate::utils::config::StagingConfig;
use crate::utils::error::StagingError;
use log::{debug, info};

/// Result of augmenting a trace
#[derive(Debug, Clone)]
pub struct StagingOutcome {
    /// Original and staging rows in final order
    pub rows: Vec<AugmentedRow>,

    /// Number of original rows
    pub input_rows: usize,

    /// Rows contributed by each rule, in evaluation order
    pub rule_counts: Vec<(StageRule, usize)>,
}

impl StagingOutcome {
    /// Total synthesized rows
    pub fn staging_rows(&self) -> usize {
        self.rule_counts.iter().map(|(_, count)| count).sum()
    }

    pub fn rows_for(&self, rule: StageRule) -> usize {
        self.rule_counts
            .iter()
            .find(|(r, _)| *r == rule)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

/// Inserts staging rows into workflow traces
pub struct StagingSynthesizer<'a> {
    config: StagingConfig,
    classifier: Box<dyn OperationClassifier + 'a>,
    sink: Box<dyn EventSink + 'a>,
}

impl Default for StagingSynthesizer<'_> {
    fn default() -> Self {
        Self::new(StagingConfig::default())
    }
}

impl<'a> StagingSynthesizer<'a> {
    /// Synthesizer with the standard classifier, logging events when `config.debug` is set
    pub fn new(config: StagingConfig) -> Self {
        Self {
            config,
            classifier: Box::new(StandardClassifier),
            sink: Box::new(LogSink),
        }
    }

    pub fn with_classifier(mut self, classifier: impl OperationClassifier + 'a) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'a) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Augment `rows` with staging rows and sort the result
    ///
    /// **Public** - main entry point for staging synthesis
    ///
    /// # Errors
    /// * `StagingError::InvalidConfig` - Configuration out of range
    /// * `StagingError::InvalidStageOrder` / `InvalidFileSize` - Input rows fail validation
    /// * `StagingError::InvalidNodeCount` - A rule resolved a node count <= 0
    pub fn augment(&self, rows: Vec<TraceRow>) -> Result<StagingOutcome, StagingError> {
        let (staging, rule_counts) = self.synthesize(&rows)?;
        let input_rows = rows.len();

        self.events().record(&StagingEvent::Combined {
            original: input_rows,
            staging: staging.len(),
        });

        let rows = combine(rows, staging);
        info!(
            "Augmented trace: {} original + {} staging = {} rows",
            input_rows,
            rows.len() - input_rows,
            rows.len()
        );

        Ok(StagingOutcome {
            rows,
            input_rows,
            rule_counts,
        })
    }

    /// Run every rule and return the staging rows without merging them
    pub fn synthesize(
        &self,
        rows: &[TraceRow],
    ) -> Result<(Vec<StagingRow>, Vec<(StageRule, usize)>), StagingError> {
        self.config.validate()?;
        validate_rows(rows)?;

        let ctx = RuleContext {
            rows,
            classifier: self.classifier.as_ref(),
            factory: RowFactory::new(&self.config),
            max_parallelism: self.config.max_parallelism,
            sink: self.events(),
        };

        let mut staging = Vec::new();
        let mut rule_counts = Vec::with_capacity(StageRule::ALL.len());
        for rule in StageRule::ALL {
            let produced = rule.apply(&ctx)?;
            debug!("{} produced {} staging rows", rule, produced.len());
            rule_counts.push((rule, produced.len()));
            staging.extend(produced);
        }

        Ok((staging, rule_counts))
    }

    fn events(&self) -> &dyn EventSink {
        if self.config.debug {
            self.sink.as_ref()
        } else {
            &NullSink
        }
    }
}

/// Augment a trace with the default classifier
///
/// **Public** - convenience wrapper over [`StagingSynthesizer`]
pub fn augment_trace(
    rows: Vec<TraceRow>,
    config: StagingConfig,
) -> Result<Vec<AugmentedRow>, StagingError> {
    Ok(StagingSynthesizer::new(config).augment(rows)?.rows)
}

/// Check the columns every rule depends on
///
/// Stage orders must be finite; file sizes must be finite and non-negative.
pub fn validate_rows(rows: &[TraceRow]) -> Result<(), StagingError> {
    for (index, row) in rows.iter().enumerate() {
        if !row.stage_order.is_finite() {
            return Err(StagingError::InvalidStageOrder {
                row: index,
                task: row.task_name.clone(),
                value: row.stage_order,
            });
        }

        let size = row.aggregate_filesize_mb_task;
        if !size.is_finite() || size < 0.0 {
            return Err(StagingError::InvalidFileSize {
                row: index,
                file: row.file_name.clone(),
                value: size,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::OperationKind;
    use crate::staging::events::RecordingSink;

    fn sample_trace() -> Vec<TraceRow> {
        vec![
            TraceRow::new("A", "f1", 10.0, 1, 0.0),
            TraceRow::new("B", "f2", 4.0, 0, 1.0).with_prev_task("A"),
        ]
    }

    #[test]
    fn test_rule_counts_sum_to_staging_rows() {
        let outcome = StagingSynthesizer::default()
            .augment(sample_trace())
            .unwrap();

        // initial 2, intermediate 8, write 4, final 2
        assert_eq!(outcome.rows_for(StageRule::InitialStageIn), 2);
        assert_eq!(outcome.rows_for(StageRule::IntermediateTransition), 8);
        assert_eq!(outcome.rows_for(StageRule::WriteTriggeredStageOut), 4);
        assert_eq!(outcome.rows_for(StageRule::FinalStageOut), 2);
        assert_eq!(outcome.staging_rows(), 16);
        assert_eq!(outcome.rows.len(), 18);
        assert_eq!(outcome.input_rows, 2);
    }

    #[test]
    fn test_events_only_with_debug() {
        let quiet = RecordingSink::new();
        StagingSynthesizer::new(StagingConfig::default())
            .with_sink(&quiet)
            .augment(sample_trace())
            .unwrap();
        assert!(quiet.events().is_empty());

        let verbose = RecordingSink::new();
        StagingSynthesizer::new(StagingConfig::default().with_debug(true))
            .with_sink(&verbose)
            .augment(sample_trace())
            .unwrap();
        assert_eq!(verbose.count("row_synthesized"), 16);
        assert_eq!(verbose.count("rule_finished"), 4);
        assert_eq!(verbose.count("combined"), 1);
    }

    #[test]
    fn test_debug_does_not_change_output() {
        let plain = augment_trace(sample_trace(), StagingConfig::default()).unwrap();
        let debug = augment_trace(sample_trace(), StagingConfig::default().with_debug(true)).unwrap();
        assert_eq!(plain, debug);
    }

    #[test]
    fn test_custom_classifier() {
        let nothing_reads = |_: &str| OperationKind::Other;
        let outcome = StagingSynthesizer::default()
            .with_classifier(nothing_reads)
            .augment(sample_trace())
            .unwrap();

        assert_eq!(outcome.rows_for(StageRule::InitialStageIn), 0);
        assert_eq!(outcome.rows_for(StageRule::WriteTriggeredStageOut), 0);
        assert_eq!(outcome.rows_for(StageRule::IntermediateTransition), 8);
    }

    #[test]
    fn test_invalid_stage_order_fails_fast() {
        let rows = vec![TraceRow::new("A", "f", 1.0, 1, f64::NAN)];
        assert!(matches!(
            StagingSynthesizer::default().augment(rows),
            Err(StagingError::InvalidStageOrder { row: 0, .. })
        ));
    }

    #[test]
    fn test_negative_size_fails_fast() {
        let rows = vec![
            TraceRow::new("A", "ok", 1.0, 1, 0.0),
            TraceRow::new("A", "bad", -2.0, 1, 0.0),
        ];
        assert!(matches!(
            StagingSynthesizer::default().augment(rows),
            Err(StagingError::InvalidFileSize { row: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = StagingConfig::default().with_max_parallelism(0);
        assert!(matches!(
            augment_trace(sample_trace(), config),
            Err(StagingError::InvalidConfig(_))
        ));
    }
}
