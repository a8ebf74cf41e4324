//! Input discovery: the supported image files directly inside a directory.

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

use super::codec::AssetFormat;

/// Finds processable images in an input directory.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// A discovered input image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageAsset {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Format implied by the file extension
    pub detected_format: AssetFormat,
}

impl ImageAsset {
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            detected_format: AssetFormat::from_path(&path),
            path,
            size,
        }
    }

    /// The bare file name, used for result records and output naming.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Name of the processed output: `processed_<original>`.
    pub fn output_name(&self) -> String {
        format!("processed_{}", self.file_name())
    }
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List supported image files in `dir` (non-recursive).
    ///
    /// Files with other extensions are skipped silently. An entry with a
    /// supported name that cannot be resolved (dangling symlink, unreadable
    /// metadata) is still listed with size 0, so it is counted and fails at
    /// decode. Results are sorted by path so that sequential runs are
    /// deterministic.
    pub fn discover(&self, dir: &Path) -> Vec<ImageAsset> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_dir() || !self.is_supported(entry.path()) {
                        continue;
                    }
                    let size = match entry.metadata() {
                        Ok(metadata) => metadata.len(),
                        Err(e) => {
                            tracing::warn!("Cannot read metadata of {:?}: {}", entry.path(), e);
                            0
                        }
                    };
                    files.push(ImageAsset::new(entry.into_path(), size));
                }
                Err(e) => match e.path() {
                    Some(path) if e.depth() > 0 && self.is_supported(path) => {
                        tracing::warn!("Cannot resolve {:?}: {}", path, e);
                        files.push(ImageAsset::new(path.to_path_buf(), 0));
                    }
                    _ => tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e),
                },
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[ImageAsset]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
