//! Trace parsing and schema definitions.
//!
//! This module handles:
//! - Loading traces from JSON and CSV
//! - Typed row records for original and staging rows
//! - Operation classification
//! - Normalizing the node-count column

pub mod node_list;
pub mod operation;
pub mod schema;
pub mod trace_reader;

// Re-export main types
pub use node_list::{resolve_node_counts, NodeList, NonPositiveNodeCount};
pub use operation::{OperationClassifier, OperationKind, StandardClassifier};
pub use schema::{AugmentedRow, CopyOp, NodeListField, StagingRow, StorageType, TraceRow};
pub use trace_reader::{parse_trace_csv, parse_trace_json, read_trace, TraceFormat};
