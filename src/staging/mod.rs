//! Synthesis of data-staging rows.
//!
//! This module transforms a workflow trace into an augmented trace:
//! - File batching bounded by max parallelism
//! - Staging row construction
//! - The four staging rules
//! - Final ordering of original and staging rows

pub mod combiner;
pub mod events;
pub mod file_groups;
pub mod row_factory;
pub mod rules;
pub mod synthesizer;

// Re-export main types and functions
pub use combiner::{combine, is_sorted, sort_rows};
pub use events::{EventSink, LogSink, NullSink, RecordingSink, StagingEvent};
pub use file_groups::{FileBatch, FileGroups};
pub use row_factory::{Direction, RowFactory, StageTarget};
pub use rules::{is_staged, RuleContext, StageRule};
pub use synthesizer::{augment_trace, validate_rows, StagingOutcome, StagingSynthesizer};
