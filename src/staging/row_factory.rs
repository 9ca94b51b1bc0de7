//! Construction of individual staging rows.

use super::file_groups::FileBatch;
use crate::parser::{NodeList, StagingRow, StorageType};
use crate::utils::config::StagingConfig;
use std::fmt;
use std::num::NonZeroU32;

/// Direction of a staging copy relative to the compute stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    StageIn,
    StageOut,
}

impl Direction {
    pub fn prefix(&self) -> &'static str {
        match self {
            Direction::StageIn => "stage_in",
            Direction::StageOut => "stage_out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Where a batch of staging rows lands in the trace
#[derive(Debug, Clone, PartialEq)]
pub struct StageTarget {
    pub direction: Direction,
    /// `0` for the initial stage-in, otherwise the originating task name
    pub label: String,
    pub stage_order: f64,
    pub prev_task: String,
}

impl StageTarget {
    pub fn new(
        direction: Direction,
        label: impl Into<String>,
        stage_order: f64,
        prev_task: impl Into<String>,
    ) -> Self {
        Self {
            direction,
            label: label.into(),
            stage_order,
            prev_task: prev_task.into(),
        }
    }

    /// `stage_in-<label>` / `stage_out-<label>`
    pub fn task_name(&self) -> String {
        format!("{}-{}", self.direction.prefix(), self.label)
    }
}

/// Builds staging rows with the synthesizer's block size and delimiter
#[derive(Debug, Clone, Copy)]
pub struct RowFactory<'c> {
    config: &'c StagingConfig,
}

impl<'c> RowFactory<'c> {
    pub fn new(config: &'c StagingConfig) -> Self {
        Self { config }
    }

    /// One copy of `batch` across `storage_type` using `num_nodes` nodes
    ///
    /// `num_nodes` is non-zero by construction, so `tasksPerNode` is always defined.
    pub fn make_row(
        &self,
        batch: &FileBatch<'_>,
        node_list: &NodeList,
        num_nodes: NonZeroU32,
        storage_type: StorageType,
        target: &StageTarget,
    ) -> StagingRow {
        let parallelism = batch.file_count();

        StagingRow {
            operation: storage_type.copy_op(),
            random_offset: 0,
            transfer_size: self.config.fs_block_size,
            aggregate_filesize_mb: batch.aggregate_size_mb(),
            num_tasks: parallelism,
            parallelism,
            total_time: None,
            num_nodes_list: node_list.to_vec(),
            num_nodes: num_nodes.get(),
            tasks_per_node: parallelism.div_ceil(num_nodes.get() as usize),
            tr_mib: None,
            storage_type,
            op_count: parallelism,
            task_name: target.task_name(),
            task_pid: String::new(),
            file_name: batch.file_names().join(self.config.file_name_delimiter.as_str()),
            stage_order: target.stage_order,
            prev_task: target.prev_task.clone(),
        }
    }
}
