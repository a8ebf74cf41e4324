//! Bounded worker pool with per-file failure isolation.
//!
//! One blocking task is spawned per input file; a semaphore caps how many run
//! at once. Results travel back through the task handles, so the awaiting task
//! is the only owner of the result list.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::{BatchError, PipelineResult};
use crate::metrics::ResourceSampler;
use crate::types::ProcessingResult;

use super::discovery::ImageAsset;

/// Default number of concurrent workers.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Fans files out over at most `max_workers` blocking threads.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_workers: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Result<Self, BatchError> {
        if max_workers == 0 {
            return Err(BatchError::InvalidWorkerCount(max_workers));
        }
        Ok(Self { max_workers })
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run `worker` once per asset and wait for every task to finish.
    ///
    /// Returns exactly one result per asset, in submission order. A failing or
    /// panicking task never affects its siblings.
    pub async fn run<F>(&self, assets: Vec<ImageAsset>, worker: F) -> Vec<ProcessingResult>
    where
        F: Fn(&ImageAsset) -> PipelineResult<()> + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let worker = Arc::new(worker);
        let span = tracing::Span::current();
        let mut slots = Vec::with_capacity(assets.len());

        for asset in assets {
            let name = asset.file_name();
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!("Worker pool closed before {} could start: {}", name, e);
                    slots.push(Slot::Done(ProcessingResult::worker_failure(name, e.to_string())));
                    continue;
                }
            };

            let worker = worker.clone();
            let span = span.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                span.in_scope(|| run_isolated(&asset, |a| worker(a)))
            });
            slots.push(Slot::Running(name, handle));
        }

        let mut results = Vec::with_capacity(slots.len());
        for slot in slots {
            let result = match slot {
                Slot::Done(result) => result,
                Slot::Running(name, handle) => handle.await.unwrap_or_else(|e| {
                    tracing::error!("Worker for {} did not complete: {}", name, e);
                    ProcessingResult::worker_failure(name, e.to_string())
                }),
            };
            results.push(result);
        }

        results
    }
}

/// Per-asset position in the result list.
enum Slot {
    Running(String, JoinHandle<ProcessingResult>),
    Done(ProcessingResult),
}

/// Process one asset inside a `file` span and turn the outcome into a result.
///
/// Errors and panics are absorbed here; nothing escapes to the caller.
pub fn run_isolated<F>(asset: &ImageAsset, f: F) -> ProcessingResult
where
    F: FnOnce(&ImageAsset) -> PipelineResult<()>,
{
    let name = asset.file_name();
    let span = tracing::info_span!("file", name = %name);
    let _enter = span.enter();

    let (outcome, delta) =
        ResourceSampler::measure(|| panic::catch_unwind(AssertUnwindSafe(|| f(asset))));

    match outcome {
        Ok(outcome) => {
            match &outcome {
                Ok(()) => tracing::debug!("Processed {} in {:?}", name, delta.wall_time),
                Err(e) => tracing::error!("Failed to process {}: {}", name, e),
            }
            ProcessingResult::from_outcome(name, &outcome, &delta)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!("Worker panicked on {}: {}", name, message);
            ProcessingResult::worker_failure(name, message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {}", s)
    } else {
        "worker panicked".to_string()
    }
}
