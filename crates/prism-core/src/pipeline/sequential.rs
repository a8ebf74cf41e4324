//! Sequential multi-pass strategy: the I/O-heavy baseline.
//!
//! Files are processed one after another on a single blocking thread, and
//! every transform step is bracketed by a decode and an encode. Keep it that
//! way: the benchmark measures the distance between this and the parallel
//! strategy.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::config::Config;
use crate::error::{BatchError, Result};
use crate::types::{BatchSummary, ProcessingResult, Strategy, TransformSpec};

use super::discovery::ImageAsset;
use super::pool::run_isolated;
use super::processor::ImageProcessor;
use super::strategy::{log_summary, Pipeline};

pub struct SequentialPipeline {
    processor: Arc<ImageProcessor>,
}

impl SequentialPipeline {
    pub fn new(config: &Config) -> Self {
        Self::with_processor(Arc::new(ImageProcessor::new(config)))
    }

    pub fn with_processor(processor: Arc<ImageProcessor>) -> Self {
        Self { processor }
    }

    async fn run(&self, assets: Vec<ImageAsset>, output: PathBuf, spec: TransformSpec) -> Result<BatchSummary> {
        let processor = self.processor.clone();
        let span = tracing::Span::current();
        let start = Instant::now();

        let results: Vec<ProcessingResult> = tokio::task::spawn_blocking(move || {
            span.in_scope(|| {
                assets
                    .iter()
                    .map(|asset| {
                        run_isolated(asset, |a| {
                            processor.process_multipass(a, &output, &spec).map(|_| ())
                        })
                    })
                    .collect()
            })
        })
        .await
        .map_err(|e| BatchError::Aborted(e.to_string()))?;

        let summary = BatchSummary::from_results(Strategy::Sequential, results, start.elapsed());
        log_summary(&summary);
        Ok(summary)
    }
}

#[async_trait]
impl Pipeline for SequentialPipeline {
    fn strategy(&self) -> Strategy {
        Strategy::Sequential
    }

    async fn process(&self, input: &Path, output: &Path, spec: &TransformSpec) -> Result<BatchSummary> {
        let assets = self.processor.prepare(input, output)?;
        let span = tracing::info_span!("batch", strategy = %Strategy::Sequential, files = assets.len());
        self.run(assets, output.to_path_buf(), *spec).instrument(span).await
    }
}
