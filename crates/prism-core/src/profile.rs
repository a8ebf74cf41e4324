//! One-shot profiling of a pipeline run.
//!
//! Produces a [`ProfileReport`] with per-file timings and memory, overall
//! timing and memory figures, and host resources sampled before and after the
//! run. `to_markdown` renders it as an analysis summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use crate::error::{BatchError, Result};
use crate::metrics::{ResourceSampler, SystemInfo};
use crate::pipeline::Pipeline;
use crate::types::{serialize_secs, ProcessingStatus, Strategy, TransformSpec};

const MB: f64 = 1024.0 * 1024.0;

/// Timing and memory for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileStats {
    #[serde(serialize_with = "serialize_secs")]
    pub execution_time: Duration,
    /// Resident memory change in bytes while the file was processed
    pub peak_memory: i64,
    pub status: ProcessingStatus,
}

/// Process resident memory over the run, in bytes.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub start: u64,
    pub end: u64,
    /// Largest per-file delta
    pub peak: i64,
}

impl MemoryStats {
    pub fn growth(&self) -> i64 {
        self.end as i64 - self.start as i64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimingStats {
    #[serde(serialize_with = "serialize_secs")]
    pub total: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub average_per_file: Duration,
    /// Process CPU time consumed by the run
    #[serde(serialize_with = "serialize_secs")]
    pub cpu_time: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemSamples {
    pub before: SystemInfo,
    pub after: SystemInfo,
}

/// Result of profiling one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub timestamp: DateTime<Utc>,
    pub strategy: Strategy,
    pub parameters: TransformSpec,
    #[serde(serialize_with = "serialize_secs")]
    pub execution_time: Duration,
    pub per_file: BTreeMap<String, FileStats>,
    pub memory_stats: MemoryStats,
    pub timing_stats: TimingStats,
    pub system_info: SystemSamples,
    pub succeeded: usize,
    pub failed: usize,
}

/// Runs a pipeline once under measurement.
pub struct Profiler;

impl Profiler {
    /// Profile `pipeline` over `input`, writing outputs to `output`.
    ///
    /// Batch-fatal errors from the pipeline propagate unchanged.
    pub async fn profile(
        pipeline: &dyn Pipeline,
        input: &Path,
        output: &Path,
        spec: &TransformSpec,
    ) -> Result<ProfileReport> {
        let timestamp = Utc::now();
        let before = sample_system().await?;

        let start = ResourceSampler::snapshot();
        let summary = pipeline.process(input, output, spec).await?;
        let end = ResourceSampler::snapshot();
        let delta = end.delta_since(&start);

        let after = sample_system().await?;

        let per_file = summary
            .results
            .iter()
            .map(|r| {
                (
                    r.filename.clone(),
                    FileStats {
                        execution_time: r.elapsed,
                        peak_memory: r.memory_delta,
                        status: r.status,
                    },
                )
            })
            .collect();

        Ok(ProfileReport {
            timestamp,
            strategy: summary.strategy,
            parameters: *spec,
            execution_time: delta.wall_time,
            per_file,
            memory_stats: MemoryStats {
                start: start.resident_memory,
                end: end.resident_memory,
                peak: summary.peak_memory_delta,
            },
            timing_stats: TimingStats {
                total: summary.total_elapsed,
                average_per_file: summary.average_per_file,
                cpu_time: delta.cpu_time,
            },
            system_info: SystemSamples { before, after },
            succeeded: summary.succeeded,
            failed: summary.failed,
        })
    }
}

async fn sample_system() -> Result<SystemInfo> {
    tokio::task::spawn_blocking(SystemInfo::sample)
        .await
        .map_err(|e| BatchError::Aborted(e.to_string()).into())
}

impl ProfileReport {
    /// Render the report as a Markdown analysis summary.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# Image Processing Performance Analysis Report\n");
        let _ = writeln!(md, "- Generated: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(md, "- Strategy: {}", self.strategy);
        let (w, h) = self.parameters.resize_dimensions;
        let _ = writeln!(
            md,
            "- Parameters: resize {}x{}, blur {}, sharpen {}, contrast {}, brightness {}\n",
            w,
            h,
            self.parameters.blur_radius,
            self.parameters.sharpen_factor,
            self.parameters.contrast_factor,
            self.parameters.brightness_factor
        );

        let _ = writeln!(md, "## Overall Statistics\n");
        let _ = writeln!(md, "- Files: {} succeeded, {} failed", self.succeeded, self.failed);
        let _ = writeln!(md, "- Total Processing Time: {:.2} seconds", self.timing_stats.total.as_secs_f64());
        let _ = writeln!(
            md,
            "- Average Time per Image: {:.2} seconds",
            self.timing_stats.average_per_file.as_secs_f64()
        );
        let _ = writeln!(md, "- CPU Time: {:.2} seconds", self.timing_stats.cpu_time.as_secs_f64());
        let _ = writeln!(md, "- Peak Memory Usage: {:.2} MB\n", self.memory_stats.peak as f64 / MB);

        let _ = writeln!(md, "## Memory Usage\n");
        let _ = writeln!(md, "- Initial Memory: {:.2} MB", self.memory_stats.start as f64 / MB);
        let _ = writeln!(md, "- Final Memory: {:.2} MB", self.memory_stats.end as f64 / MB);
        let _ = writeln!(md, "- Memory Growth: {:.2} MB\n", self.memory_stats.growth() as f64 / MB);

        if !self.per_file.is_empty() {
            let _ = writeln!(md, "## Per-file Statistics\n");
            let _ = writeln!(md, "| File | Status | Time (s) | Memory (MB) |");
            let _ = writeln!(md, "|------|--------|----------|-------------|");
            for (name, stats) in &self.per_file {
                let status = match stats.status {
                    ProcessingStatus::Success => "ok",
                    ProcessingStatus::Failed => "failed",
                };
                let _ = writeln!(
                    md,
                    "| {} | {} | {:.3} | {:.2} |",
                    name,
                    status,
                    stats.execution_time.as_secs_f64(),
                    stats.peak_memory as f64 / MB
                );
            }
            md.push('\n');
        }

        let _ = writeln!(md, "## System\n");
        let _ = writeln!(md, "| | CPUs | CPU % | Memory total (MB) | Memory available (MB) |");
        let _ = writeln!(md, "|---|---|---|---|---|");
        for (label, info) in [("before", &self.system_info.before), ("after", &self.system_info.after)] {
            let _ = writeln!(
                md,
                "| {} | {} | {:.1} | {:.0} | {:.0} |",
                label,
                info.cpu_count,
                info.cpu_percent,
                info.memory_total as f64 / MB,
                info.memory_available as f64 / MB
            );
        }

        md
    }
}
