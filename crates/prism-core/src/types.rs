//! Core data types for the Prism transformation pipeline.
//!
//! These types describe what a run is asked to do ([`TransformSpec`]) and what
//! it produced ([`ProcessingResult`], [`BatchSummary`]).

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use crate::error::{PipelineResult, TransformError};
use crate::metrics::ResourceDelta;

/// Parameter bundle for one processing run.
///
/// Created once per run or benchmark variant and shared read-only by every
/// worker of that run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSpec {
    /// Target `(width, height)` of the resize step
    pub resize_dimensions: (u32, u32),

    /// Gaussian blur radius; 0 disables the step
    pub blur_radius: f64,

    /// Sharpness factor (1.0 = unchanged)
    pub sharpen_factor: f64,

    /// Contrast factor (1.0 = unchanged)
    pub contrast_factor: f64,

    /// Brightness factor (1.0 = unchanged)
    pub brightness_factor: f64,
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self {
            resize_dimensions: (800, 600),
            blur_radius: 1.0,
            sharpen_factor: 1.5,
            contrast_factor: 1.2,
            brightness_factor: 1.1,
        }
    }
}

impl TransformSpec {
    /// A spec that only resizes: every other step is an identity.
    pub fn resize_only(width: u32, height: u32) -> Self {
        Self {
            resize_dimensions: (width, height),
            blur_radius: 0.0,
            sharpen_factor: 1.0,
            contrast_factor: 1.0,
            brightness_factor: 1.0,
        }
    }

    /// Check that dimensions are positive and every factor is finite and non-negative.
    pub fn validate(&self) -> Result<(), TransformError> {
        let (width, height) = self.resize_dimensions;
        if width == 0 || height == 0 {
            return Err(TransformError::ZeroDimension);
        }
        for (name, value) in self.factors() {
            if !value.is_finite() {
                return Err(TransformError::NonFiniteFactor { name });
            }
            if value < 0.0 {
                return Err(TransformError::NegativeFactor { name, value });
            }
        }
        Ok(())
    }

    /// Check that the resize target stays within `max_dim` on both axes.
    pub fn check_within(&self, max_dim: u32) -> Result<(), TransformError> {
        let (width, height) = self.resize_dimensions;
        if width > max_dim || height > max_dim {
            return Err(TransformError::DimensionTooLarge {
                width,
                height,
                max_dim,
            });
        }
        Ok(())
    }

    fn factors(&self) -> [(&'static str, f64); 4] {
        [
            ("blur_radius", self.blur_radius),
            ("sharpen_factor", self.sharpen_factor),
            ("contrast_factor", self.contrast_factor),
            ("brightness_factor", self.brightness_factor),
        ]
    }
}

/// Execution strategy of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Single-threaded, decode/encode around every transform step
    Sequential,
    /// Worker pool, one decode and one encode per file
    Parallel,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::Parallel => write!(f, "parallel"),
        }
    }
}

/// Outcome of processing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Success,
    Failed,
}

/// Category of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Decode,
    Transform,
    Encode,
    /// The worker task itself died (panic) before reporting an outcome
    Worker,
}

/// Result record for one input file. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    /// Input file name (no directory)
    pub filename: String,

    pub status: ProcessingStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    /// Human-readable failure cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall time spent on this file
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,

    /// Resident memory change in bytes while processing this file (may be negative)
    pub memory_delta: i64,
}

impl ProcessingResult {
    /// Build a result from a worker outcome and its measured resource delta.
    pub fn from_outcome(filename: String, outcome: &PipelineResult<()>, delta: &ResourceDelta) -> Self {
        match outcome {
            Ok(()) => Self {
                filename,
                status: ProcessingStatus::Success,
                error_kind: None,
                error: None,
                elapsed: delta.wall_time,
                memory_delta: delta.memory_delta,
            },
            Err(e) => Self {
                filename,
                status: ProcessingStatus::Failed,
                error_kind: Some(e.kind()),
                error: Some(e.to_string()),
                elapsed: delta.wall_time,
                memory_delta: delta.memory_delta,
            },
        }
    }

    /// A failure for a task that never reported back.
    pub fn worker_failure(filename: String, message: String) -> Self {
        Self {
            filename,
            status: ProcessingStatus::Failed,
            error_kind: Some(ErrorKind::Worker),
            error: Some(message),
            elapsed: Duration::ZERO,
            memory_delta: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ProcessingStatus::Success
    }
}

/// Aggregate over every [`ProcessingResult`] of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub strategy: Strategy,

    pub succeeded: usize,

    pub failed: usize,

    /// Wall time of the whole batch
    #[serde(serialize_with = "serialize_secs")]
    pub total_elapsed: Duration,

    /// `total_elapsed` divided by the number of files
    #[serde(serialize_with = "serialize_secs")]
    pub average_per_file: Duration,

    /// Largest per-file memory delta in bytes
    pub peak_memory_delta: i64,

    pub results: Vec<ProcessingResult>,
}

impl BatchSummary {
    /// Derive the summary from the full result list of a batch.
    pub fn from_results(
        strategy: Strategy,
        mut results: Vec<ProcessingResult>,
        total_elapsed: Duration,
    ) -> Self {
        // Parallel completion order is arbitrary; keep reports stable.
        results.sort_by(|a, b| a.filename.cmp(&b.filename));

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        let average_per_file = if results.is_empty() {
            Duration::ZERO
        } else {
            total_elapsed / results.len() as u32
        };
        let peak_memory_delta = results.iter().map(|r| r.memory_delta).max().unwrap_or(0);

        Self {
            strategy,
            succeeded,
            failed,
            total_elapsed,
            average_per_file,
            peak_memory_delta,
            results,
        }
    }

    /// Total number of files the batch accounted for.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Iterate over failed results only.
    pub fn failures(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

/// Serialize a duration as fractional seconds.
pub(crate) fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::path::PathBuf;

    fn delta(ms: u64, mem: i64) -> ResourceDelta {
        ResourceDelta {
            wall_time: Duration::from_millis(ms),
            cpu_time: Duration::ZERO,
            memory_delta: mem,
        }
    }

    #[test]
    fn test_default_spec() {
        let spec = TransformSpec::default();
        assert_eq!(spec.resize_dimensions, (800, 600));
        assert_eq!(spec.blur_radius, 1.0);
        assert_eq!(spec.sharpen_factor, 1.5);
        assert_eq!(spec.contrast_factor, 1.2);
        assert_eq!(spec.brightness_factor, 1.1);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_spec_rejects_negative_factor() {
        let spec = TransformSpec {
            contrast_factor: -0.5,
            ..TransformSpec::default()
        };
        assert_eq!(
            spec.validate(),
            Err(TransformError::NegativeFactor {
                name: "contrast_factor",
                value: -0.5
            })
        );
    }

    #[test]
    fn test_spec_rejects_zero_dimension_and_nan() {
        assert_eq!(
            TransformSpec::resize_only(0, 10).validate(),
            Err(TransformError::ZeroDimension)
        );
        let spec = TransformSpec {
            blur_radius: f64::NAN,
            ..TransformSpec::default()
        };
        assert!(matches!(
            spec.validate(),
            Err(TransformError::NonFiniteFactor { name: "blur_radius" })
        ));
    }

    #[test]
    fn test_spec_rejects_target_above_limit() {
        let spec = TransformSpec::resize_only(70_000, 1);
        assert!(spec.validate().is_ok());
        assert_eq!(
            spec.check_within(20_000),
            Err(TransformError::DimensionTooLarge {
                width: 70_000,
                height: 1,
                max_dim: 20_000
            })
        );
        assert!(TransformSpec::default().check_within(800).is_ok());
    }

    #[test]
    fn test_spec_toml_roundtrip_with_partial_fields() {
        let spec: TransformSpec = toml::from_str("resize_dimensions = [50, 40]").unwrap();
        assert_eq!(spec.resize_dimensions, (50, 40));
        assert_eq!(spec.sharpen_factor, 1.5);
    }

    #[test]
    fn test_summary_counts_and_peak() {
        let failure: PipelineResult<()> = Err(PipelineError::Decode {
            path: PathBuf::from("b.jpg"),
            message: "corrupt".into(),
        });
        let results = vec![
            ProcessingResult::from_outcome("c.jpg".into(), &Ok(()), &delta(10, 300)),
            ProcessingResult::from_outcome("b.jpg".into(), &failure, &delta(5, -20)),
            ProcessingResult::from_outcome("a.jpg".into(), &Ok(()), &delta(10, 100)),
        ];
        let summary =
            BatchSummary::from_results(Strategy::Parallel, results, Duration::from_millis(30));

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.average_per_file, Duration::from_millis(10));
        assert_eq!(summary.peak_memory_delta, 300);
        assert_eq!(summary.results[0].filename, "a.jpg");

        let failed: Vec<_> = summary.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error_kind, Some(ErrorKind::Decode));
    }

    #[test]
    fn test_result_serializes_seconds() {
        let result = ProcessingResult::from_outcome("a.png".into(), &Ok(()), &delta(1500, 0));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["elapsed"], 1.5);
        assert_eq!(json["status"], "success");
        assert!(json.get("error_kind").is_none());
    }
}
