//! Parallel single-pass strategy: one decode, the full chain in memory, one
//! optimized encode per file, files spread over a [`WorkerPool`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::config::Config;
use crate::error::{BatchError, Result};
use crate::types::{BatchSummary, Strategy, TransformSpec};

use super::discovery::ImageAsset;
use super::pool::WorkerPool;
use super::processor::ImageProcessor;
use super::strategy::{log_summary, Pipeline};

pub struct ParallelPipeline {
    processor: Arc<ImageProcessor>,
    pool: WorkerPool,
}

impl ParallelPipeline {
    /// Build with `processing.max_workers` workers.
    pub fn new(config: &Config) -> std::result::Result<Self, BatchError> {
        let pool = WorkerPool::new(config.processing.max_workers)?;
        Ok(Self::with_pool(Arc::new(ImageProcessor::new(config)), pool))
    }

    pub fn with_pool(processor: Arc<ImageProcessor>, pool: WorkerPool) -> Self {
        Self { processor, pool }
    }

    pub fn max_workers(&self) -> usize {
        self.pool.max_workers()
    }

    async fn run(&self, assets: Vec<ImageAsset>, output: PathBuf, spec: TransformSpec) -> BatchSummary {
        let processor = self.processor.clone();
        let start = Instant::now();

        let results = self
            .pool
            .run(assets, move |asset| {
                processor.process_singlepass(asset, &output, &spec).map(|_| ())
            })
            .await;

        let summary = BatchSummary::from_results(Strategy::Parallel, results, start.elapsed());
        log_summary(&summary);
        summary
    }
}

#[async_trait]
impl Pipeline for ParallelPipeline {
    fn strategy(&self) -> Strategy {
        Strategy::Parallel
    }

    async fn process(&self, input: &Path, output: &Path, spec: &TransformSpec) -> Result<BatchSummary> {
        let assets = self.processor.prepare(input, output)?;
        let span = tracing::info_span!(
            "batch",
            strategy = %Strategy::Parallel,
            files = assets.len(),
            workers = self.pool.max_workers()
        );
        Ok(self.run(assets, output.to_path_buf(), *spec).instrument(span).await)
    }
}
