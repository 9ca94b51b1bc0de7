//! Observability hooks for staging synthesis.
//!
//! The synthesizer reports its decisions to an [`EventSink`] instead of
//! printing them. Events are only emitted when `StagingConfig::debug` is set.

use super::rules::StageRule;
use crate::parser::StagingRow;
use log::debug;
use std::cell::RefCell;
use std::fmt;

/// A decision taken while synthesizing staging rows
#[derive(Debug, Clone, Copy)]
pub enum StagingEvent<'a> {
    /// Rows selected as a rule's source
    SourceSelected { rule: StageRule, rows: usize },

    /// A task excluded because it is already a staging task
    TaskSkipped { rule: StageRule, task: &'a str },

    /// Row synthesized by a rule
    RowSynthesized { rule: StageRule, row: &'a StagingRow },

    /// A rule finished
    RuleFinished { rule: StageRule, rows: usize },

    /// Original and staging rows merged and sorted
    Combined { original: usize, staging: usize },
}

impl StagingEvent<'_> {
    /// Short event identifier
    pub fn name(&self) -> &'static str {
        match self {
            StagingEvent::SourceSelected { .. } => "source_selected",
            StagingEvent::TaskSkipped { .. } => "task_skipped",
            StagingEvent::RowSynthesized { .. } => "row_synthesized",
            StagingEvent::RuleFinished { .. } => "rule_finished",
            StagingEvent::Combined { .. } => "combined",
        }
    }
}

impl fmt::Display for StagingEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagingEvent::SourceSelected { rule, rows } => {
                write!(f, "{}: {} source rows found", rule, rows)
            }
            StagingEvent::TaskSkipped { rule, task } => {
                write!(f, "{}: skipping staging task '{}'", rule, task)
            }
            StagingEvent::RowSynthesized { rule, row } => write!(
                f,
                "{}: added {} {} stageOrder={} files={} nodes={} size={}MB",
                rule,
                row.task_name,
                row.storage_type,
                row.stage_order,
                row.parallelism,
                row.num_nodes,
                row.aggregate_filesize_mb
            ),
            StagingEvent::RuleFinished { rule, rows } => {
                write!(f, "{}: {} staging rows", rule, rows)
            }
            StagingEvent::Combined { original, staging } => write!(
                f,
                "Total rows after staging: {} ({} original, {} staging)",
                original + staging,
                original,
                staging
            ),
        }
    }
}

/// Receives staging events
pub trait EventSink {
    fn record(&self, event: &StagingEvent<'_>);
}

/// Forwards events to the `log` facade at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &StagingEvent<'_>) {
        debug!("{}", event);
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &StagingEvent<'_>) {}
}

/// Keeps rendered events in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<(&'static str, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(name, rendered message)` pairs in emission order
    pub fn events(&self) -> Vec<(&'static str, String)> {
        self.events.borrow().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.borrow().iter().filter(|(n, _)| *n == name).count()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &StagingEvent<'_>) {
        self.events
            .borrow_mut()
            .push((event.name(), event.to_string()));
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn record(&self, event: &StagingEvent<'_>) {
        (**self).record(event);
    }
}
