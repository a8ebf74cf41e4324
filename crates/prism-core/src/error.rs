//! Error types for the Prism transformation pipeline.
//!
//! Errors are split by blast radius: [`PipelineError`] describes a failure of a
//! single file and is absorbed into a failed [`ProcessingResult`], while
//! [`BatchError`] aborts a whole invocation before any file is touched.
//!
//! [`ProcessingResult`]: crate::types::ProcessingResult

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ErrorKind;

/// Top-level error type for Prism operations.
#[derive(Error, Debug)]
pub enum PrismError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-file pipeline errors surfaced outside a batch
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Batch-fatal errors
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Transformation parameter errors
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised by the transform chain for a single raster.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("{name} must be >= 0, got {value}")]
    NegativeFactor { name: &'static str, value: f64 },

    #[error("{name} must be a finite number")]
    NonFiniteFactor { name: &'static str },

    #[error("resize dimensions must be positive")]
    ZeroDimension,

    #[error("resize target {width}x{height} exceeds the {max_dim} pixel limit")]
    DimensionTooLarge { width: u32, height: u32, max_dim: u32 },

    #[error("invalid raster: {0}")]
    InvalidRaster(String),
}

/// Per-file processing errors. Recoverable at batch level.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed (unreadable, corrupt or unrecognized container)
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// A transform step rejected its parameters or produced an invalid raster
    #[error("Transform failed for {path}: {source}")]
    Transform {
        path: PathBuf,
        #[source]
        source: TransformError,
    },

    /// Writing the output file failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

impl PipelineError {
    /// The error category recorded on a failed processing result.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Transform { .. } => ErrorKind::Transform,
            PipelineError::Encode { .. } => ErrorKind::Encode,
            PipelineError::Decode { .. }
            | PipelineError::FileTooLarge { .. }
            | PipelineError::ImageTooLarge { .. }
            | PipelineError::FileNotFound(_) => ErrorKind::Decode,
        }
    }
}

/// Errors that abort an entire batch invocation.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Input directory not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("No supported images found in {0}")]
    NoImages(PathBuf),

    #[error("Cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("max_workers must be > 0, got {0}")]
    InvalidWorkerCount(usize),

    #[error("iterations must be > 0, got {0}")]
    InvalidIterations(usize),

    /// A blocking batch task panicked or was cancelled
    #[error("Batch aborted: {0}")]
    Aborted(String),
}

/// Convenience type alias for Prism results.
pub type Result<T> = std::result::Result<T, PrismError>;

/// Convenience type alias for per-file pipeline results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
