//! Per-file processing: decode, transform, encode.
//!
//! Two routines share the same codec and transform chain:
//! - [`ImageProcessor::process_singlepass`] keeps the raster in memory between
//!   steps (used by the parallel strategy).
//! - [`ImageProcessor::process_multipass`] writes the raster to disk and reads
//!   it back around every step (used by the sequential strategy). Intermediate
//!   passes go through a lossless scratch PNG so both routines produce the same
//!   pixels.

use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::Config;
use crate::error::{BatchError, PipelineError, PipelineResult};
use crate::types::TransformSpec;

use super::codec::{select_format, EncodeFormat, EncodeOptions, ImageCodec};
use super::discovery::{FileDiscovery, ImageAsset};
use super::transform::{check_raster, TransformChain, TransformStep};

/// Decode/transform/encode for single files plus batch input preparation.
pub struct ImageProcessor {
    codec: ImageCodec,
    discovery: FileDiscovery,
}

impl ImageProcessor {
    /// Create a new image processor with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            codec: ImageCodec::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
        }
    }

    /// Access the codec.
    pub fn codec(&self) -> &ImageCodec {
        &self.codec
    }

    /// Discover supported images in a directory.
    pub fn discover(&self, dir: &Path) -> Vec<ImageAsset> {
        self.discovery.discover(dir)
    }

    /// Check batch preconditions and list the inputs.
    ///
    /// Fails when the input is missing, is not a directory or holds no
    /// supported image. Creates the output directory if needed.
    pub fn prepare(&self, input: &Path, output: &Path) -> Result<Vec<ImageAsset>, BatchError> {
        if !input.exists() {
            return Err(BatchError::InputNotFound(input.to_path_buf()));
        }
        if !input.is_dir() {
            return Err(BatchError::NotADirectory(input.to_path_buf()));
        }

        let assets = self.discover(input);
        if assets.is_empty() {
            return Err(BatchError::NoImages(input.to_path_buf()));
        }

        std::fs::create_dir_all(output).map_err(|source| BatchError::OutputDir {
            path: output.to_path_buf(),
            source,
        })?;

        tracing::debug!(
            "Prepared {} images ({} bytes) from {:?}",
            assets.len(),
            FileDiscovery::total_size(&assets),
            input
        );
        Ok(assets)
    }

    /// Decode once, run the whole chain in memory, encode once with optimization.
    pub fn process_singlepass(
        &self,
        asset: &ImageAsset,
        output_dir: &Path,
        spec: &TransformSpec,
    ) -> PipelineResult<PathBuf> {
        self.check_target(asset, spec)?;
        let start = Instant::now();
        let image = self.codec.decode(&asset.path)?;
        tracing::trace!("  Decode: {:?}", start.elapsed());

        let transform_start = Instant::now();
        let image = TransformChain::apply(image, spec).map_err(|source| PipelineError::Transform {
            path: asset.path.clone(),
            source,
        })?;
        tracing::trace!("  Transform: {:?}", transform_start.elapsed());

        let target = output_dir.join(asset.output_name());
        let encode_start = Instant::now();
        self.codec.encode(
            &image,
            &target,
            select_format(&asset.file_name()),
            EncodeOptions::optimized(),
        )?;
        tracing::trace!("  Encode: {:?}", encode_start.elapsed());

        Ok(target)
    }

    /// Run every step as its own decode/transform/encode round trip.
    ///
    /// The scratch file is removed whether or not the file succeeds.
    pub fn process_multipass(
        &self,
        asset: &ImageAsset,
        output_dir: &Path,
        spec: &TransformSpec,
    ) -> PipelineResult<PathBuf> {
        spec.validate().map_err(|source| PipelineError::Transform {
            path: asset.path.clone(),
            source,
        })?;
        self.check_target(asset, spec)?;

        let scratch = ScratchFile::new(output_dir.join(format!(".{}.pass.png", asset.output_name())));
        let target = output_dir.join(asset.output_name());
        let last = TransformStep::ORDER.len() - 1;

        let mut source = asset.path.clone();
        for (pass, step) in TransformStep::ORDER.iter().enumerate() {
            let start = Instant::now();
            let image = self.codec.decode(&source)?;
            let image = step.apply(image, spec).map_err(|e| PipelineError::Transform {
                path: asset.path.clone(),
                source: e,
            })?;

            if pass == last {
                self.finish(&image, &target, asset, spec)?;
            } else {
                self.codec
                    .encode(&image, scratch.path(), EncodeFormat::Png, EncodeOptions::baseline())?;
                source = scratch.path().to_path_buf();
            }
            tracing::trace!("  Pass {} ({}): {:?}", pass + 1, step, start.elapsed());
        }

        Ok(target)
    }

    /// Refuse resize targets beyond the dimension limit before allocating them.
    fn check_target(&self, asset: &ImageAsset, spec: &TransformSpec) -> PipelineResult<()> {
        spec.check_within(self.codec.limits().max_image_dimension)
            .map_err(|source| PipelineError::Transform {
                path: asset.path.clone(),
                source,
            })
    }

    fn finish(
        &self,
        image: &DynamicImage,
        target: &Path,
        asset: &ImageAsset,
        spec: &TransformSpec,
    ) -> PipelineResult<()> {
        check_raster(image, spec).map_err(|source| PipelineError::Transform {
            path: asset.path.clone(),
            source,
        })?;
        self.codec.encode(
            image,
            target,
            select_format(&asset.file_name()),
            EncodeOptions::baseline(),
        )
    }
}

/// Intermediate file deleted on drop.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!("Failed to remove scratch file {:?}: {}", self.path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        ImageCodec::new(Default::default())
            .encode(&DynamicImage::ImageRgb8(img), &path, EncodeFormat::Png, EncodeOptions::baseline())
            .unwrap();
        path
    }

    #[test]
    fn test_prepare_errors() {
        let processor = ImageProcessor::new(&Config::default());
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let missing = dir.path().join("missing");
        assert!(matches!(
            processor.prepare(&missing, &out),
            Err(BatchError::InputNotFound(_))
        ));

        let file = dir.path().join("file.png");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            processor.prepare(&file, &out),
            Err(BatchError::NotADirectory(_))
        ));

        let empty = dir.path().join("empty");
        std::fs::create_dir(&empty).unwrap();
        assert!(matches!(
            processor.prepare(&empty, &out),
            Err(BatchError::NoImages(_))
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_prepare_creates_output_dir() {
        let processor = ImageProcessor::new(&Config::default());
        let input = tempfile::tempdir().unwrap();
        write_png(input.path(), "a.png", 4, 4);
        let out = input.path().join("nested").join("out");

        let assets = processor.prepare(input.path(), &out).unwrap();
        assert_eq!(assets.len(), 1);
        assert!(out.is_dir());
    }

    #[test]
    fn test_singlepass_and_multipass_agree() {
        let processor = ImageProcessor::new(&Config::default());
        let input = tempfile::tempdir().unwrap();
        write_png(input.path(), "img.png", 60, 40);
        let assets = processor.discover(input.path());
        let spec = TransformSpec {
            resize_dimensions: (30, 20),
            ..TransformSpec::default()
        };

        let single_dir = tempfile::tempdir().unwrap();
        let multi_dir = tempfile::tempdir().unwrap();
        let single = processor.process_singlepass(&assets[0], single_dir.path(), &spec).unwrap();
        let multi = processor.process_multipass(&assets[0], multi_dir.path(), &spec).unwrap();

        assert_eq!(single.file_name().unwrap(), "processed_img.png");
        let a = processor.codec().decode(&single).unwrap();
        let b = processor.codec().decode(&multi).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());

        // only the final output remains
        let entries: Vec<_> = std::fs::read_dir(multi_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_multipass_removes_scratch_on_failure() {
        let processor = ImageProcessor::new(&Config::default());
        let input = tempfile::tempdir().unwrap();
        write_png(input.path(), "img.png", 8, 8);
        let assets = processor.discover(input.path());
        let out = tempfile::tempdir().unwrap();

        // Fail at the final encode by occupying the target name with a directory.
        std::fs::create_dir(out.path().join("processed_img.png")).unwrap();
        let err = processor
            .process_multipass(&assets[0], out.path(), &TransformSpec::resize_only(4, 4))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encode { .. }));
        assert!(!out.path().join(".processed_img.png.pass.png").exists());
    }

    #[test]
    fn test_invalid_spec_is_transform_error() {
        let processor = ImageProcessor::new(&Config::default());
        let input = tempfile::tempdir().unwrap();
        write_png(input.path(), "img.png", 8, 8);
        let assets = processor.discover(input.path());
        let out = tempfile::tempdir().unwrap();
        let spec = TransformSpec {
            blur_radius: -2.0,
            ..TransformSpec::default()
        };

        let err = processor.process_multipass(&assets[0], out.path(), &spec).unwrap_err();
        assert!(matches!(err, PipelineError::Transform { .. }));
        let err = processor.process_singlepass(&assets[0], out.path(), &spec).unwrap_err();
        assert!(matches!(err, PipelineError::Transform { .. }));
    }

    #[test]
    fn test_oversized_target_fails_before_decode() {
        let processor = ImageProcessor::new(&Config::default());
        let input = tempfile::tempdir().unwrap();
        write_png(input.path(), "img.png", 8, 8);
        let assets = processor.discover(input.path());
        let out = tempfile::tempdir().unwrap();
        let spec = TransformSpec::resize_only(1_000_000, 1_000_000);

        for err in [
            processor.process_singlepass(&assets[0], out.path(), &spec).unwrap_err(),
            processor.process_multipass(&assets[0], out.path(), &spec).unwrap_err(),
        ] {
            assert!(matches!(
                err,
                PipelineError::Transform {
                    source: TransformError::DimensionTooLarge { .. },
                    ..
                }
            ));
        }
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_rejected_encode_leaves_no_output() {
        let mut config = Config::default();
        config.limits.max_image_dimension = 100_000;
        let processor = ImageProcessor::new(&config);
        let input = tempfile::tempdir().unwrap();
        write_png(input.path(), "wide.jpg", 20, 20);
        let assets = processor.discover(input.path());
        let out = tempfile::tempdir().unwrap();

        // Wider than a JPEG can store.
        let spec = TransformSpec::resize_only(70_000, 1);
        let err = processor.process_singlepass(&assets[0], out.path(), &spec).unwrap_err();
        assert!(matches!(err, PipelineError::Encode { .. }));
        assert!(!out.path().join("processed_wide.jpg").exists());
    }
}
