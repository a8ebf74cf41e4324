//! Repeated, measured runs of both strategies across parameter variants.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{BatchError, Result};
use crate::metrics::{ResourceDelta, ResourceSampler};
use crate::pipeline::{build_pipeline, Pipeline};
use crate::types::{BatchSummary, Strategy, TransformSpec};

use super::testdata::generate_test_images;

/// Where benchmark inputs come from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// A fresh synthetic set per variant and iteration, written under the work dir
    Generated { num_images: usize, image_size: (u32, u32) },
    /// An existing directory, read but never modified
    Directory(PathBuf),
}

impl InputSource {
    /// Generated inputs as configured in `[benchmark]`.
    pub fn from_config(config: &Config) -> Self {
        InputSource::Generated {
            num_images: config.benchmark.num_images,
            image_size: config.benchmark.image_size,
        }
    }
}

/// One measured (variant, iteration, strategy) run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRecord {
    /// Position of the variant in the list passed to `compare`
    pub variant_index: usize,
    pub variant: TransformSpec,
    /// Zero-based iteration
    pub iteration: usize,
    pub strategy: Strategy,
    /// Process resources consumed by the whole batch
    pub resources: ResourceDelta,
    pub summary: BatchSummary,
}

/// Callback invoked after every record.
pub type RecordCallback = Box<dyn Fn(&BenchmarkRecord) + Send + Sync>;

/// Drives both pipeline strategies over every variant and iteration.
pub struct BenchmarkHarness {
    sequential: Box<dyn Pipeline>,
    parallel: Box<dyn Pipeline>,
    input: InputSource,
    work_dir: PathBuf,
    on_record: Option<RecordCallback>,
}

impl BenchmarkHarness {
    /// Build both pipelines from `config`; scratch data goes to `general.work_dir`.
    pub fn new(config: &Config, input: InputSource) -> Result<Self> {
        Ok(Self::with_pipelines(
            build_pipeline(Strategy::Sequential, config)?,
            build_pipeline(Strategy::Parallel, config)?,
            input,
            config.work_dir(),
        ))
    }

    pub fn with_pipelines(
        sequential: Box<dyn Pipeline>,
        parallel: Box<dyn Pipeline>,
        input: InputSource,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            sequential,
            parallel,
            input,
            work_dir,
            on_record: None,
        }
    }

    /// Override the scratch root.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Register a progress callback.
    pub fn on_record<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BenchmarkRecord) + Send + Sync + 'static,
    {
        self.on_record = Some(Box::new(callback));
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Number of records `compare` will produce.
    pub fn expected_records(variants: usize, iterations: usize) -> usize {
        2 * variants * iterations
    }

    /// Run sequential then parallel for every variant and iteration.
    ///
    /// Returns one record per (variant, iteration, strategy), in run order.
    /// Each strategy writes into an output directory that is emptied right
    /// before its run.
    pub async fn compare(&self, variants: &[TransformSpec], iterations: usize) -> Result<Vec<BenchmarkRecord>> {
        if iterations == 0 {
            return Err(BatchError::InvalidIterations(iterations).into());
        }

        let mut records = Vec::with_capacity(Self::expected_records(variants.len(), iterations));
        for (variant_index, variant) in variants.iter().enumerate() {
            for iteration in 0..iterations {
                tracing::info!(
                    "Variant {}/{} ({}x{}), iteration {}/{}",
                    variant_index + 1,
                    variants.len(),
                    variant.resize_dimensions.0,
                    variant.resize_dimensions.1,
                    iteration + 1,
                    iterations
                );

                let input_dir = self.prepare_input(variant_index, iteration).await?;
                for pipeline in [&self.sequential, &self.parallel] {
                    let strategy = pipeline.strategy();
                    let output_dir = self
                        .work_dir
                        .join("output")
                        .join(run_name(variant_index, iteration))
                        .join(strategy.to_string());
                    reset_dir(&output_dir)?;

                    let (summary, resources) =
                        ResourceSampler::measure_async(pipeline.process(&input_dir, &output_dir, variant)).await;
                    let summary = summary?;

                    tracing::info!(
                        "{}: time={:.2}s cpu={:.2}s memory={:+.2}MB ({} ok, {} failed)",
                        strategy,
                        resources.wall_time.as_secs_f64(),
                        resources.cpu_time.as_secs_f64(),
                        resources.memory_delta as f64 / (1024.0 * 1024.0),
                        summary.succeeded,
                        summary.failed
                    );

                    let record = BenchmarkRecord {
                        variant_index,
                        variant: *variant,
                        iteration,
                        strategy,
                        resources,
                        summary,
                    };
                    if let Some(callback) = &self.on_record {
                        callback(&record);
                    }
                    records.push(record);
                }
            }
        }

        Ok(records)
    }

    async fn prepare_input(&self, variant_index: usize, iteration: usize) -> Result<PathBuf> {
        match &self.input {
            InputSource::Directory(dir) => Ok(dir.clone()),
            InputSource::Generated {
                num_images,
                image_size,
            } => {
                let dir = self
                    .work_dir
                    .join("input")
                    .join(run_name(variant_index, iteration));
                reset_dir(&dir)?;

                let (target, count, size) = (dir.clone(), *num_images, *image_size);
                tokio::task::spawn_blocking(move || generate_test_images(&target, count, size))
                    .await
                    .map_err(|e| BatchError::Aborted(e.to_string()))??;
                Ok(dir)
            }
        }
    }
}

fn run_name(variant_index: usize, iteration: usize) -> String {
    format!("variant_{}_iter_{}", variant_index, iteration)
}

/// Remove `dir` with everything in it and create it again empty.
fn reset_dir(dir: &Path) -> std::result::Result<(), BatchError> {
    let reset = || -> std::io::Result<()> {
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)
    };
    reset().map_err(|source| BatchError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.processing.max_workers = 2;
        config
    }

    #[test]
    fn test_reset_dir_empties_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("leftover.png"), b"x").unwrap();

        reset_dir(&target).unwrap();
        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_zero_iterations_rejected() {
        let work = tempfile::tempdir().unwrap();
        let harness = BenchmarkHarness::new(&small_config(), InputSource::Generated {
            num_images: 1,
            image_size: (16, 16),
        })
        .unwrap()
        .with_work_dir(work.path());

        let err = harness.compare(&[TransformSpec::default()], 0).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::PrismError::Batch(BatchError::InvalidIterations(0))
        ));
    }

    #[tokio::test]
    async fn test_compare_produces_record_per_run() {
        let work = tempfile::tempdir().unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();

        let harness = BenchmarkHarness::new(&small_config(), InputSource::Generated {
            num_images: 2,
            image_size: (48, 32),
        })
        .unwrap()
        .with_work_dir(work.path())
        .on_record(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let variants = [TransformSpec::resize_only(24, 16), TransformSpec {
            resize_dimensions: (20, 10),
            ..TransformSpec::default()
        }];
        let records = harness.compare(&variants, 2).await.unwrap();

        assert_eq!(records.len(), BenchmarkHarness::expected_records(2, 2));
        assert_eq!(seen.load(Ordering::SeqCst), 8);
        assert!(records.iter().all(|r| r.summary.succeeded == 2 && r.summary.failed == 0));
        assert_eq!(records[0].strategy, Strategy::Sequential);
        assert_eq!(records[1].strategy, Strategy::Parallel);
        assert_eq!(records[7].variant_index, 1);
        assert_eq!(records[7].iteration, 1);

        let out = work.path().join("output").join("variant_1_iter_1").join("parallel");
        assert_eq!(std::fs::read_dir(out).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_directory_input_is_left_untouched() {
        let input = tempfile::tempdir().unwrap();
        generate_test_images(input.path(), 1, (20, 20)).unwrap();
        let work = tempfile::tempdir().unwrap();

        let harness = BenchmarkHarness::new(&small_config(), InputSource::Directory(input.path().to_path_buf()))
            .unwrap()
            .with_work_dir(work.path());
        let records = harness.compare(&[TransformSpec::resize_only(10, 10)], 1).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(std::fs::read_dir(input.path()).unwrap().count(), 1);
        assert!(!work.path().join("input").exists());
    }
}
