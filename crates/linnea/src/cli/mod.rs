//! CLI command handlers.

pub mod config;
pub mod datasets;
pub mod eval;
pub mod hierarchy;
pub mod report;
