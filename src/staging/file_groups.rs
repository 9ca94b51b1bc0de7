//! Partition the files of a row subset into bounded batches.
//!
//! A file reference is distinct per (taskPID, fileName, size). Batches keep
//! first-occurrence order and hold at most `max_parallelism` files each.

use crate::parser::TraceRow;
use serde_json::Value;
use std::collections::HashSet;

/// Deduplicated file references of a row subset, ready for batching
///
/// [`FileGroups::batches`] can be called any number of times; each call
/// walks the same batches from the start.
#[derive(Debug, Clone)]
pub struct FileGroups<'a> {
    files: Vec<&'a TraceRow>,
    max_parallelism: usize,
}

/// Up to `max_parallelism` distinct files moved by one staging row
#[derive(Debug, Clone, Copy)]
pub struct FileBatch<'a> {
    rows: &'a [&'a TraceRow],
}

impl<'a> FileGroups<'a> {
    /// Deduplicate `rows`
    ///
    /// `max_parallelism` must be positive (enforced by `StagingConfig::validate`).
    pub fn new<I>(rows: I, max_parallelism: usize) -> Self
    where
        I: IntoIterator<Item = &'a TraceRow>,
    {
        let mut seen: HashSet<(PidKey, &'a str, u64)> = HashSet::new();
        let files = rows
            .into_iter()
            .filter(|&row| {
                seen.insert((
                    PidKey::from_value(&row.task_pid),
                    row.file_name.as_str(),
                    size_key(row.aggregate_filesize_mb_task),
                ))
            })
            .collect();

        Self {
            files,
            max_parallelism: max_parallelism.max(1),
        }
    }

    /// Contiguous batches in first-occurrence order
    pub fn batches(&self) -> impl Iterator<Item = FileBatch<'_>> + '_ {
        self.files
            .chunks(self.max_parallelism)
            .map(|rows| FileBatch { rows })
    }

    pub fn batch_count(&self) -> usize {
        self.files.len().div_ceil(self.max_parallelism)
    }

    /// Number of distinct file references
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<'a> FileBatch<'a> {
    pub fn file_names(&self) -> Vec<&'a str> {
        self.rows.iter().map(|row| row.file_name.as_str()).collect()
    }

    /// Sum of `aggregateFilesizeMBtask` over the batch
    ///
    /// Summed in ascending order so the result does not depend on row order.
    pub fn aggregate_size_mb(&self) -> f64 {
        let mut sizes: Vec<f64> = self
            .rows
            .iter()
            .map(|row| row.aggregate_filesize_mb_task)
            .collect();
        sizes.sort_by(f64::total_cmp);
        sizes.iter().sum()
    }

    pub fn file_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &'a [&'a TraceRow] {
        self.rows
    }
}

/// Identity of a `taskPID` cell
///
/// Numeric values (and numeric text, as CSV cells arrive) compare by value,
/// so `1`, `1.0` and `"1"` are the same task. A missing PID differs from an
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PidKey {
    Missing,
    Number(u64),
    Text(String),
}

impl PidKey {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => PidKey::Missing,
            Value::Number(n) => n
                .as_f64()
                .map(|v| PidKey::Number(size_key(v)))
                .unwrap_or_else(|| PidKey::Text(n.to_string())),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => PidKey::Number(size_key(v)),
                _ => PidKey::Text(s.clone()),
            },
            other => PidKey::Text(other.to_string()),
        }
    }
}

/// Hashable identity for a size; `0.0` and `-0.0` compare equal
fn size_key(size: f64) -> u64 {
    if size == 0.0 {
        0
    } else {
        size.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(pid: i64, name: &str, size: f64) -> TraceRow {
        TraceRow::new("task", name, size, "1", 0.0).with_task_pid(pid)
    }

    #[test]
    fn test_deduplicates_on_pid_name_size() {
        let rows = vec![
            file(1, "a", 1.0),
            file(1, "a", 1.0),
            file(2, "a", 1.0),
            file(1, "a", 2.0),
            file(1, "b", 1.0),
        ];
        let groups = FileGroups::new(&rows, 60);

        assert_eq!(groups.file_count(), 4);
        let batch = groups.batches().next().unwrap();
        assert_eq!(batch.file_names(), vec!["a", "a", "a", "b"]);
        assert_eq!(batch.aggregate_size_mb(), 5.0);
    }

    #[test]
    fn test_pid_identity_follows_value() {
        let rows = vec![
            file(1, "a", 1.0),
            TraceRow::new("task", "a", 1.0, "1", 0.0).with_task_pid(1.0),
            TraceRow::new("task", "a", 1.0, "1", 0.0).with_task_pid("1"),
            TraceRow::new("task", "a", 1.0, "1", 0.0),
            TraceRow::new("task", "a", 1.0, "1", 0.0).with_task_pid(""),
        ];
        let groups = FileGroups::new(&rows, 60);

        // 1 / 1.0 / "1" collapse; null and "" stay apart
        assert_eq!(groups.file_count(), 3);
    }

    #[test]
    fn test_batches_are_bounded_and_ordered() {
        let rows: Vec<TraceRow> = (0..130).map(|i| file(i, &format!("f{}", i), 1.0)).collect();
        let groups = FileGroups::new(&rows, 60);

        let sizes: Vec<usize> = groups.batches().map(|b| b.file_count()).collect();
        assert_eq!(sizes, vec![60, 60, 10]);
        assert_eq!(groups.batch_count(), 3);

        let names: Vec<String> = groups
            .batches()
            .flat_map(|b| b.file_names())
            .map(str::to_string)
            .collect();
        let expected: Vec<String> = (0..130).map(|i| format!("f{}", i)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_batches_restart() {
        let rows = vec![file(1, "a", 1.0), file(2, "b", 2.0)];
        let groups = FileGroups::new(&rows, 1);
        assert_eq!(groups.batches().count(), 2);
        assert_eq!(groups.batches().count(), 2);
    }

    #[test]
    fn test_empty_subset_has_no_batches() {
        let groups = FileGroups::new(std::iter::empty(), 60);
        assert!(groups.is_empty());
        assert_eq!(groups.batch_count(), 0);
        assert_eq!(groups.batches().count(), 0);
    }

    #[test]
    fn test_aggregate_size_is_order_invariant() {
        let forward = vec![file(1, "a", 0.1), file(2, "b", 0.2), file(3, "c", 0.3)];
        let reversed: Vec<TraceRow> = forward.iter().rev().cloned().collect();

        let a = FileGroups::new(&forward, 60);
        let b = FileGroups::new(&reversed, 60);
        let size_a = a.batches().next().unwrap().aggregate_size_mb();
        let size_b = b.batches().next().unwrap().aggregate_size_mb();
        assert_eq!(size_a.to_bits(), size_b.to_bits());
    }
}
