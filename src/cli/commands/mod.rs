//! CLI command implementations

pub mod batch;
pub mod completions;
pub mod config;
pub mod run;
