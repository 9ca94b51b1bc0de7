//! Workflow Staging
//!
//! Augments multi-stage workflow I/O traces with synthesized data-staging
//! rows: copies between the shared parallel filesystem (beegfs) and
//! node-local tiers (ssd, tmpfs) before, between and after compute stages.
//!
//! ## Getting Started
//!
//! ```ignore
//! use workflow_staging::parser::read_trace;
//! use workflow_staging::staging::StagingSynthesizer;
//! use workflow_staging::utils::config::StagingConfig;
//!
//! let rows = read_trace("trace.csv")?;
//! let outcome = StagingSynthesizer::new(StagingConfig::default()).augment(rows)?;
//! ```

pub mod commands;
pub mod output;
pub mod parser;
pub mod staging;
pub mod utils;
