//! Merge original and staging rows into the final trace order.

use crate::parser::{AugmentedRow, StagingRow, TraceRow};
use std::cmp::Ordering;

/// Concatenate original and staging rows and sort by `(stageOrder, taskName)`
pub fn combine(original: Vec<TraceRow>, staging: Vec<StagingRow>) -> Vec<AugmentedRow> {
    let mut rows: Vec<AugmentedRow> = original
        .into_iter()
        .map(AugmentedRow::Trace)
        .chain(staging.into_iter().map(AugmentedRow::Staging))
        .collect();

    sort_rows(&mut rows);
    rows
}

/// Stable ascending sort: numeric stage order, then task name
pub fn sort_rows(rows: &mut [AugmentedRow]) {
    rows.sort_by(compare_rows);
}

/// True when no adjacent pair is out of `(stageOrder, taskName)` order
pub fn is_sorted(rows: &[AugmentedRow]) -> bool {
    rows.windows(2)
        .all(|pair| compare_rows(&pair[0], &pair[1]) != Ordering::Greater)
}

fn compare_rows(a: &AugmentedRow, b: &AugmentedRow) -> Ordering {
    // Stage orders are validated finite before synthesis
    a.stage_order()
        .partial_cmp(&b.stage_order())
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.task_name().cmp(b.task_name()))
}
