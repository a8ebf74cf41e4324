//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.max_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.max_workers must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        let max_dim = self.limits.max_image_dimension;
        self.transform
            .validate()
            .and_then(|()| self.transform.check_within(max_dim))
            .map_err(|e| ConfigError::ValidationError(format!("transform: {e}")))?;
        if self.benchmark.iterations == 0 {
            return Err(ConfigError::ValidationError(
                "benchmark.iterations must be > 0".into(),
            ));
        }
        if self.benchmark.num_images == 0 {
            return Err(ConfigError::ValidationError(
                "benchmark.num_images must be > 0".into(),
            ));
        }
        let (width, height) = self.benchmark.image_size;
        if width == 0 || height == 0 {
            return Err(ConfigError::ValidationError(
                "benchmark.image_size must be positive".into(),
            ));
        }
        for (i, variant) in self.benchmark.variants.iter().enumerate() {
            variant.validate().and_then(|()| variant.check_within(max_dim)).map_err(|e| {
                ConfigError::ValidationError(format!("benchmark.variants[{i}]: {e}"))
            })?;
        }
        Ok(())
    }
}
