//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod augment;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use augment::{execute_augment, validate_args};
pub use models::AugmentArgs;
pub use utils::{display_config, display_validation, display_version, validate_trace_file, TraceStats};
