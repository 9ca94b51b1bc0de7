//! The four staging rules.
//!
//! Each rule selects its own source rows from the original trace and emits
//! one staging row per (tier, file batch, node count[, task]) combination.
//! Rules are evaluated independently: a task at stage >= 1 that also writes
//! gets stage-out rows from both the intermediate and the write-triggered
//! rule.

use super::events::{EventSink, StagingEvent};
use super::file_groups::FileGroups;
use super::row_factory::{Direction, RowFactory, StageTarget};
use crate::parser::{
    resolve_node_counts, NodeList, NonPositiveNodeCount, OperationClassifier, OperationKind,
    StagingRow, StorageType, TraceRow,
};
use crate::utils::config::{STAGE_IN_MARKER, STAGE_OUT_MARKER};
use crate::utils::error::StagingError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

const INITIAL_TIERS: &[StorageType] = &[StorageType::BeegfsTmpfs, StorageType::BeegfsSsd];

const TRANSITION_TIERS: &[StorageType] = &[
    StorageType::BeegfsSsd,
    StorageType::BeegfsTmpfs,
    StorageType::SsdSsd,
    StorageType::TmpfsTmpfs,
];

const FINAL_TIERS: &[StorageType] = &[StorageType::TmpfsBeegfs, StorageType::SsdBeegfs];

/// Label used for the initial stage-in (`stage_in-0`)
pub const INITIAL_STAGE_LABEL: &str = "0";

/// Stage order of the initial stage-in rows
pub const INITIAL_STAGE_ORDER: f64 = -1.0;

/// Offset between a compute stage and its surrounding staging rows
pub const STAGE_OFFSET: f64 = 0.5;

/// A staging rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageRule {
    /// beegfs -> node-local tiers before the first stage
    InitialStageIn,
    /// Stage-in and stage-out around every stage >= 1
    IntermediateTransition,
    /// Stage-out after every task that writes
    WriteTriggeredStageOut,
    /// Node-local tiers -> beegfs after the last stage
    FinalStageOut,
}

/// Everything a rule needs to run
pub struct RuleContext<'a> {
    pub rows: &'a [TraceRow],
    pub classifier: &'a dyn OperationClassifier,
    pub factory: RowFactory<'a>,
    pub max_parallelism: usize,
    pub sink: &'a dyn EventSink,
}

impl RuleContext<'_> {
    fn classify(&self, row: &TraceRow) -> OperationKind {
        self.classifier.classify(&row.operation_code())
    }
}

impl StageRule {
    /// Evaluation order used by the synthesizer
    pub const ALL: [StageRule; 4] = [
        StageRule::InitialStageIn,
        StageRule::IntermediateTransition,
        StageRule::WriteTriggeredStageOut,
        StageRule::FinalStageOut,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageRule::InitialStageIn => "initial_stage_in",
            StageRule::IntermediateTransition => "intermediate_transition",
            StageRule::WriteTriggeredStageOut => "write_triggered_stage_out",
            StageRule::FinalStageOut => "final_stage_out",
        }
    }

    /// Storage tier pairs this rule copies across
    pub fn tiers(&self) -> &'static [StorageType] {
        match self {
            StageRule::InitialStageIn => INITIAL_TIERS,
            StageRule::IntermediateTransition | StageRule::WriteTriggeredStageOut => {
                TRANSITION_TIERS
            }
            StageRule::FinalStageOut => FINAL_TIERS,
        }
    }

    /// Synthesize this rule's staging rows
    ///
    /// # Errors
    /// * `StagingError::InvalidNodeCount` - A source group resolves to a node count <= 0
    pub fn apply(&self, ctx: &RuleContext<'_>) -> Result<Vec<StagingRow>, StagingError> {
        let rows = match self {
            StageRule::InitialStageIn => self.initial_stage_in(ctx)?,
            StageRule::IntermediateTransition => self.intermediate_transition(ctx)?,
            StageRule::WriteTriggeredStageOut => self.write_triggered_stage_out(ctx)?,
            StageRule::FinalStageOut => self.final_stage_out(ctx)?,
        };

        ctx.sink.record(&StagingEvent::RuleFinished {
            rule: *self,
            rows: rows.len(),
        });
        Ok(rows)
    }

    fn initial_stage_in(&self, ctx: &RuleContext<'_>) -> Result<Vec<StagingRow>, StagingError> {
        let source: Vec<&TraceRow> = ctx
            .rows
            .iter()
            .filter(|row| row.stage_order == 0.0 && ctx.classify(row) == OperationKind::Read)
            .collect();

        ctx.sink.record(&StagingEvent::SourceSelected {
            rule: *self,
            rows: source.len(),
        });

        let Some(first) = source.first() else {
            return Ok(Vec::new());
        };

        let files = FileGroups::new(source.iter().copied(), ctx.max_parallelism);
        let nodes = self.resolve_nodes(&first.task_name, &source)?;
        let target = StageTarget::new(
            Direction::StageIn,
            INITIAL_STAGE_LABEL,
            INITIAL_STAGE_ORDER,
            "",
        );

        let mut out = Vec::new();
        for &tier in self.tiers() {
            self.emit(ctx, &files, &nodes, tier, &target, &mut out);
        }
        Ok(out)
    }

    fn intermediate_transition(
        &self,
        ctx: &RuleContext<'_>,
    ) -> Result<Vec<StagingRow>, StagingError> {
        let source: Vec<&TraceRow> = ctx
            .rows
            .iter()
            .filter(|row| row.stage_order >= 1.0)
            .collect();

        ctx.sink.record(&StagingEvent::SourceSelected {
            rule: *self,
            rows: source.len(),
        });

        let mut out = Vec::new();
        for (task, group) in group_by_task(&source) {
            if is_staged(task) {
                ctx.sink.record(&StagingEvent::TaskSkipped { rule: *self, task });
                continue;
            }

            let first = group[0];
            let prev_task = first.prev_task.clone().unwrap_or_default();
            let files = FileGroups::new(group.iter().copied(), ctx.max_parallelism);
            let nodes = self.resolve_nodes(task, &group)?;

            let stage_in = StageTarget::new(
                Direction::StageIn,
                task,
                first.stage_order - STAGE_OFFSET,
                prev_task,
            );
            let stage_out = StageTarget::new(
                Direction::StageOut,
                task,
                first.stage_order + STAGE_OFFSET,
                task,
            );

            for &tier in self.tiers() {
                self.emit(ctx, &files, &nodes, tier, &stage_in, &mut out);
                self.emit(ctx, &files, &nodes, tier, &stage_out, &mut out);
            }
        }
        Ok(out)
    }

    fn write_triggered_stage_out(
        &self,
        ctx: &RuleContext<'_>,
    ) -> Result<Vec<StagingRow>, StagingError> {
        let source: Vec<&TraceRow> = ctx
            .rows
            .iter()
            .filter(|row| ctx.classify(row) == OperationKind::Write)
            .collect();

        ctx.sink.record(&StagingEvent::SourceSelected {
            rule: *self,
            rows: source.len(),
        });

        let mut out = Vec::new();
        for (task, group) in group_by_task(&source) {
            if is_staged(task) {
                ctx.sink.record(&StagingEvent::TaskSkipped { rule: *self, task });
                continue;
            }

            let first = group[0];
            let files = FileGroups::new(group.iter().copied(), ctx.max_parallelism);
            let nodes = self.resolve_nodes(task, &group)?;
            let stage_out = StageTarget::new(
                Direction::StageOut,
                task,
                first.stage_order + STAGE_OFFSET,
                task,
            );

            for &tier in self.tiers() {
                self.emit(ctx, &files, &nodes, tier, &stage_out, &mut out);
            }
        }
        Ok(out)
    }

    fn final_stage_out(&self, ctx: &RuleContext<'_>) -> Result<Vec<StagingRow>, StagingError> {
        let Some(max_stage) = ctx
            .rows
            .iter()
            .map(|row| row.stage_order)
            .reduce(f64::max)
        else {
            ctx.sink.record(&StagingEvent::SourceSelected {
                rule: *self,
                rows: 0,
            });
            return Ok(Vec::new());
        };

        let source: Vec<&TraceRow> = ctx
            .rows
            .iter()
            .filter(|row| row.stage_order == max_stage)
            .collect();

        ctx.sink.record(&StagingEvent::SourceSelected {
            rule: *self,
            rows: source.len(),
        });

        let Some(first) = source.first() else {
            return Ok(Vec::new());
        };

        // Distinct final task names in first-appearance order
        let mut tasks: Vec<&str> = Vec::new();
        for row in &source {
            let task = row.task_name.as_str();
            if tasks.contains(&task) {
                continue;
            }
            if is_staged(task) {
                ctx.sink.record(&StagingEvent::TaskSkipped { rule: *self, task });
            }
            tasks.push(task);
        }
        let targets: Vec<StageTarget> = tasks
            .into_iter()
            .filter(|task| !is_staged(task))
            .map(|task| {
                StageTarget::new(Direction::StageOut, task, max_stage + STAGE_OFFSET, task)
            })
            .collect();
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let files = FileGroups::new(source.iter().copied(), ctx.max_parallelism);
        let nodes = self.resolve_nodes(&first.task_name, &source)?;

        // Every batch is replicated once per final task
        let mut out = Vec::new();
        for &tier in self.tiers() {
            for batch in files.batches() {
                for num_nodes in nodes.iter() {
                    for target in &targets {
                        let row = ctx.factory.make_row(&batch, &nodes, num_nodes, tier, target);
                        ctx.sink.record(&StagingEvent::RowSynthesized {
                            rule: *self,
                            row: &row,
                        });
                        out.push(row);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Rows for every (batch, node count) of one tier and target
    fn emit(
        &self,
        ctx: &RuleContext<'_>,
        files: &FileGroups<'_>,
        nodes: &NodeList,
        tier: StorageType,
        target: &StageTarget,
        out: &mut Vec<StagingRow>,
    ) {
        for batch in files.batches() {
            for num_nodes in nodes.iter() {
                let row = ctx.factory.make_row(&batch, nodes, num_nodes, tier, target);
                ctx.sink.record(&StagingEvent::RowSynthesized {
                    rule: *self,
                    row: &row,
                });
                out.push(row);
            }
        }
    }

    fn resolve_nodes(&self, task: &str, rows: &[&TraceRow]) -> Result<NodeList, StagingError> {
        NodeList::try_from_counts(&resolve_node_counts(rows)).map_err(
            |NonPositiveNodeCount(value)| StagingError::InvalidNodeCount {
                rule: *self,
                task: task.to_string(),
                value,
            },
        )
    }
}

impl fmt::Display for StageRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// True when the task name marks a staging task
pub fn is_staged(task_name: &str) -> bool {
    task_name.contains(STAGE_IN_MARKER) || task_name.contains(STAGE_OUT_MARKER)
}

/// Group rows by task name, in ascending name order
fn group_by_task<'a>(rows: &[&'a TraceRow]) -> BTreeMap<&'a str, Vec<&'a TraceRow>> {
    let mut groups: BTreeMap<&'a str, Vec<&'a TraceRow>> = BTreeMap::new();
    for &row in rows {
        groups.entry(row.task_name.as_str()).or_default().push(row);
    }
    groups
}
