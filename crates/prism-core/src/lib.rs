//! Prism Core - batch image transformation and strategy benchmarking.
//!
//! Prism applies a fixed five-step transform chain (resize, blur, sharpen,
//! contrast, brightness) to every supported image in a directory, using one
//! of two interchangeable strategies, and measures how they compare.
//!
//! # Architecture
//!
//! ```text
//! BenchmarkHarness → Pipeline (sequential | parallel via WorkerPool)
//!                  → decode → TransformChain → encode     (per file)
//!                  → ResourceSampler deltas → BenchmarkRecord
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism_core::{Config, Prism, Strategy};
//!
//! #[tokio::main]
//! async fn main() -> prism_core::Result<()> {
//!     let prism = Prism::new(Config::load()?);
//!     let summary = prism.process(Strategy::Parallel, "./in".as_ref(), "./out".as_ref()).await?;
//!     println!("{} ok, {} failed", summary.succeeded, summary.failed);
//!     Ok(())
//! }
//! ```

pub mod bench;
pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod types;

use std::path::Path;

pub use bench::{BenchmarkHarness, BenchmarkRecord, Comparison, InputSource};
pub use config::Config;
pub use error::{BatchError, ConfigError, PipelineError, PipelineResult, PrismError, Result, TransformError};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{build_pipeline, Pipeline, TransformChain};
pub use profile::{ProfileReport, Profiler};
pub use types::{BatchSummary, ErrorKind, ProcessingResult, ProcessingStatus, Strategy, TransformSpec};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point bundling a configuration with the operations built on it.
pub struct Prism {
    config: Config,
}

impl Prism {
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing Prism v{}", VERSION);
        Self { config }
    }

    /// Load the configuration from its default location.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(Config::load()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build a pipeline for `strategy`.
    pub fn pipeline(&self, strategy: Strategy) -> Result<Box<dyn Pipeline>> {
        Ok(build_pipeline(strategy, &self.config)?)
    }

    /// Process `input` into `output` with the configured transform.
    pub async fn process(&self, strategy: Strategy, input: &Path, output: &Path) -> Result<BatchSummary> {
        self.pipeline(strategy)?
            .process(input, output, &self.config.transform)
            .await
    }

    /// A benchmark harness over `input`, scratch data under the work dir.
    pub fn benchmark(&self, input: InputSource) -> Result<BenchmarkHarness> {
        BenchmarkHarness::new(&self.config, input)
    }

    /// Profile one run of `strategy` with the configured transform.
    pub async fn profile(&self, strategy: Strategy, input: &Path, output: &Path) -> Result<ProfileReport> {
        let pipeline = self.pipeline(strategy)?;
        Profiler::profile(pipeline.as_ref(), input, output, &self.config.transform).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_prism_new() {
        let prism = Prism::new(Config::default());
        assert_eq!(prism.config().processing.max_workers, 4);
        assert_eq!(prism.pipeline(Strategy::Parallel).unwrap().strategy(), Strategy::Parallel);
    }

    #[tokio::test]
    async fn test_process_empty_dir_is_fatal() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let err = Prism::new(Config::default())
            .process(Strategy::Sequential, input.path(), output.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PrismError::Batch(BatchError::NoImages(_))));
    }
}
