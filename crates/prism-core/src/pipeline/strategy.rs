//! The `Pipeline` trait shared by both execution strategies.

use async_trait::async_trait;
use std::path::Path;

use crate::config::Config;
use crate::error::{BatchError, Result};
use crate::types::{BatchSummary, Strategy, TransformSpec};

use super::parallel::ParallelPipeline;
use super::sequential::SequentialPipeline;

/// Batch processor over a directory of images.
///
/// Implementations differ in I/O pattern and concurrency but must write
/// pixel-identical outputs for the same input and spec.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// The strategy this pipeline implements.
    fn strategy(&self) -> Strategy;

    /// Process every supported image in `input`, writing `processed_<name>`
    /// files into `output`.
    ///
    /// Per-file failures are recorded in the summary. Only batch-fatal
    /// conditions (missing or empty input, unusable output directory) return
    /// an error, and they do so before any file is processed.
    async fn process(&self, input: &Path, output: &Path, spec: &TransformSpec) -> Result<BatchSummary>;
}

/// Build the pipeline for `strategy` from configuration.
pub fn build_pipeline(strategy: Strategy, config: &Config) -> std::result::Result<Box<dyn Pipeline>, BatchError> {
    Ok(match strategy {
        Strategy::Sequential => Box::new(SequentialPipeline::new(config)),
        Strategy::Parallel => Box::new(ParallelPipeline::new(config)?),
    })
}

/// Log the outcome of a finished batch.
pub(crate) fn log_summary(summary: &BatchSummary) {
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "{} batch finished in {:?} ({:?}/file)",
        summary.strategy,
        summary.total_elapsed,
        summary.average_per_file
    );
    for failure in summary.failures() {
        tracing::debug!(
            "  {} failed: {}",
            failure.filename,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
}
