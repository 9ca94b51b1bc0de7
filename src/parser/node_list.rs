//! Normalization of the `numNodesList` column.
//!
//! The column arrives as a native list, a bare number, or a textual encoding
//! such as `"[1, 2]"`. Everything past this module sees a [`NodeList`]:
//! a non-empty ordered sequence of positive node counts.

use super::schema::{NodeListField, TraceRow};
use log::warn;
use serde_json::Value;
use std::num::NonZeroU32;

/// Node counts used when a row carries no `numNodesList`
pub const DEFAULT_NODE_COUNTS: &[i64] = &[1];

/// Ordered, non-empty list of positive node counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeList(Vec<NonZeroU32>);

/// A resolved node count that cannot drive a staging row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonPositiveNodeCount(pub i64);

impl NodeList {
    /// Validate raw counts; the first value that is zero, negative or out of range is returned
    pub fn try_from_counts(counts: &[i64]) -> Result<Self, NonPositiveNodeCount> {
        let nodes = counts
            .iter()
            .map(|&count| {
                u32::try_from(count)
                    .ok()
                    .and_then(NonZeroU32::new)
                    .ok_or(NonPositiveNodeCount(count))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if nodes.is_empty() {
            return Err(NonPositiveNodeCount(0));
        }
        Ok(Self(nodes))
    }

    pub fn iter(&self) -> impl Iterator<Item = NonZeroU32> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.0.iter().map(|n| n.get()).collect()
    }
}

/// Resolve the node counts of a row subset from its first row
///
/// Never fails: a missing value yields `[1]`, a malformed encoding falls back
/// to the value coerced to a single integer, and then to `[1]`.
pub fn resolve_node_counts(rows: &[&TraceRow]) -> Vec<i64> {
    match rows.first().and_then(|row| row.num_nodes_list.as_ref()) {
        None => DEFAULT_NODE_COUNTS.to_vec(),
        Some(NodeListField::List(values)) if !values.is_empty() => values.clone(),
        Some(NodeListField::List(_)) => {
            warn!("Empty numNodesList, defaulting to {:?}", DEFAULT_NODE_COUNTS);
            DEFAULT_NODE_COUNTS.to_vec()
        }
        Some(NodeListField::Values(values)) => parse_node_list_values(values),
        Some(NodeListField::Integer(value)) => vec![*value],
        Some(NodeListField::Float(value)) => vec![value.trunc() as i64],
        Some(NodeListField::Text(text)) => parse_node_list_text(text),
    }
}

/// Normalize a native list whose elements are floats or numeric text
fn parse_node_list_values(values: &[Value]) -> Vec<i64> {
    let parsed = values
        .iter()
        .map(|value| match value {
            Value::Number(n) => n.as_i64().or_else(|| parse_integer(&n.to_string())),
            Value::String(s) => parse_integer(s.trim()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>();

    match parsed {
        Some(counts) if !counts.is_empty() => counts,
        _ => {
            warn!(
                "Malformed numNodesList {:?}, defaulting to {:?}",
                values, DEFAULT_NODE_COUNTS
            );
            DEFAULT_NODE_COUNTS.to_vec()
        }
    }
}

/// Parse a textual node list, with fallback
pub fn parse_node_list_text(text: &str) -> Vec<i64> {
    if let Some(values) = parse_sequence(text) {
        return values;
    }

    if let Some(value) = parse_integer(text.trim()) {
        warn!(
            "Could not parse numNodesList {:?} as a list, using single value {}",
            text, value
        );
        return vec![value];
    }

    warn!(
        "Malformed numNodesList {:?}, defaulting to {:?}",
        text, DEFAULT_NODE_COUNTS
    );
    DEFAULT_NODE_COUNTS.to_vec()
}

/// `[1, 2]`, `(1, 2)`, `1 2` or `4`
fn parse_sequence(text: &str) -> Option<Vec<i64>> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .or_else(|| trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')))
        .unwrap_or(trimmed);

    let values = inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(parse_integer)
        .collect::<Option<Vec<_>>>()?;

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Integer, or a float with no fractional part
fn parse_integer(token: &str) -> Option<i64> {
    if let Ok(value) = token.parse::<i64>() {
        return Some(value);
    }
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .map(|v| v as i64)
}
