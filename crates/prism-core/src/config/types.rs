//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::TransformSpec;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Scratch root for generated benchmark inputs and outputs
    pub work_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("~/.prism/work"),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum concurrently running workers for the parallel strategy
    pub max_workers: usize,

    /// Supported input extensions (matched case-insensitively)
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_workers: crate::pipeline::pool::DEFAULT_MAX_WORKERS,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "bmp".to_string(),
                "tiff".to_string(),
            ],
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 20000,
        }
    }
}

/// Benchmark settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Repetitions per variant and strategy
    pub iterations: usize,

    /// Number of generated input images per iteration
    pub num_images: usize,

    /// Size `(width, height)` of generated input images
    pub image_size: (u32, u32),

    /// Parameter variants to compare
    pub variants: Vec<TransformSpec>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            iterations: 3,
            num_images: 5,
            image_size: (1920, 1080),
            variants: vec![
                TransformSpec::default(),
                TransformSpec {
                    resize_dimensions: (1024, 768),
                    blur_radius: 2.0,
                    sharpen_factor: 2.0,
                    contrast_factor: 1.5,
                    brightness_factor: 1.3,
                },
                TransformSpec {
                    resize_dimensions: (1920, 1080),
                    blur_radius: 3.0,
                    sharpen_factor: 2.5,
                    contrast_factor: 1.8,
                    brightness_factor: 1.5,
                },
            ],
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: pretty, json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
