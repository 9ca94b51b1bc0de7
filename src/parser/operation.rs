//! Classification of raw operation codes.
//!
//! Traces encode I/O direction either numerically (`1` = read, `0` = write)
//! or by name. Anything else, including the `cp`/`scp` of staging rows,
//! is `Other`.

use serde::{Deserialize, Serialize};

/// Semantic category of a trace operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Read,
    Write,
    Other,
}

impl std::str::FromStr for OperationKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();

        // Numeric codes may arrive as floats from tabular sources
        if let Ok(n) = code.parse::<f64>() {
            return Ok(if n == 1.0 {
                Self::Read
            } else if n == 0.0 {
                Self::Write
            } else {
                Self::Other
            });
        }

        Ok(match code.as_str() {
            "read" | "r" => Self::Read,
            "write" | "w" => Self::Write,
            _ => Self::Other,
        })
    }
}

/// Maps a raw operation code to its semantic category
///
/// Implemented for any `Fn(&str) -> OperationKind`, so callers can pass a
/// closure when their trace uses a different encoding.
pub trait OperationClassifier {
    fn classify(&self, raw_operation: &str) -> OperationKind;
}

impl<F> OperationClassifier for F
where
    F: Fn(&str) -> OperationKind,
{
    fn classify(&self, raw_operation: &str) -> OperationKind {
        self(raw_operation)
    }
}

/// Default classifier for the workflow trace encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardClassifier;

impl OperationClassifier for StandardClassifier {
    fn classify(&self, raw_operation: &str) -> OperationKind {
        raw_operation
            .parse()
            .unwrap_or(OperationKind::Other)
    }
}
