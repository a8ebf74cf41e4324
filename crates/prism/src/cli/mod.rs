//! Subcommand implementations.

pub mod benchmark;
pub mod config;
pub mod process;
pub mod profile;
mod types;

pub use types::{expand_path, parse_dimensions, ReportFormat, StrategyArg, TransformArgs};
