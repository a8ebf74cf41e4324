//! Image codec: decode a file into a raster, encode a raster back to disk.
//!
//! The output container is chosen from the file name by [`select_format`];
//! pixel data never depends on [`EncodeOptions`], which only trade encode time
//! for file size.

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::{DynamicImage, GenericImageView, ImageReader};
use serde::Serialize;
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

use super::validate::Validator;

/// JPEG quality used by every encode, baseline or optimized.
pub const JPEG_QUALITY: u8 = 75;

/// Format of an input file as implied by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFormat {
    Jpeg,
    Png,
    Bmp,
    Tiff,
    Unknown,
}

impl AssetFormat {
    /// Classify a path by its lowercase extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("jpg" | "jpeg") => AssetFormat::Jpeg,
            Some("png") => AssetFormat::Png,
            Some("bmp") => AssetFormat::Bmp,
            Some("tiff") => AssetFormat::Tiff,
            _ => AssetFormat::Unknown,
        }
    }
}

/// Container written by [`ImageCodec::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeFormat {
    Jpeg,
    Png,
    Bmp,
    Tiff,
}

/// Pick the output container for a file name.
///
/// JPEG for `.jpg`/`.jpeg` and for anything unrecognized.
pub fn select_format(filename: &str) -> EncodeFormat {
    match AssetFormat::from_path(Path::new(filename)) {
        AssetFormat::Png => EncodeFormat::Png,
        AssetFormat::Bmp => EncodeFormat::Bmp,
        AssetFormat::Tiff => EncodeFormat::Tiff,
        AssetFormat::Jpeg | AssetFormat::Unknown => EncodeFormat::Jpeg,
    }
}

/// Encoder tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Spend more time compressing (PNG: best compression, adaptive filtering)
    pub optimize: bool,
}

impl EncodeOptions {
    /// The codec defaults.
    pub fn baseline() -> Self {
        Self { optimize: false }
    }

    /// Format-aware size optimization.
    pub fn optimized() -> Self {
        Self { optimize: true }
    }
}

/// Decoder/encoder with pre-decode validation and dimension limits.
pub struct ImageCodec {
    validator: Validator,
    limits: LimitsConfig,
}

impl ImageCodec {
    /// Create a new codec with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            validator: Validator::new(limits.clone()),
            limits,
        }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Decode the image at `path`.
    ///
    /// The container is detected from content, not the extension.
    pub fn decode(&self, path: &Path) -> PipelineResult<DynamicImage> {
        self.validator.validate(path)?;

        let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read file: {}", e),
        })?;
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        if reader.format().is_none() {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image container".to_string(),
            });
        }
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }
        Ok(image)
    }

    /// Write `image` to `path` as `format`.
    ///
    /// The raster is encoded in memory first. `path` is only created once the
    /// encoder has accepted it, and is removed again if the write fails.
    pub fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: EncodeFormat,
        options: EncodeOptions,
    ) -> PipelineResult<()> {
        let encode_err = |message: String| PipelineError::Encode {
            path: path.to_path_buf(),
            message,
        };

        let mut buffer = Cursor::new(Vec::new());
        let encoded = match format {
            EncodeFormat::Jpeg => {
                // JPEG carries no alpha channel.
                if image.color().has_alpha() {
                    DynamicImage::ImageRgb8(image.to_rgb8())
                        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))
                } else {
                    image.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))
                }
            }
            EncodeFormat::Png if options.optimize => image.write_with_encoder(
                PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive),
            ),
            EncodeFormat::Png => image.write_with_encoder(PngEncoder::new(&mut buffer)),
            EncodeFormat::Bmp => image.write_with_encoder(BmpEncoder::new(&mut buffer)),
            EncodeFormat::Tiff => image.write_with_encoder(TiffEncoder::new(&mut buffer)),
        };
        encoded.map_err(|e| encode_err(e.to_string()))?;

        let mut file =
            File::create(path).map_err(|e| encode_err(format!("Cannot create file: {}", e)))?;
        if let Err(e) = file.write_all(buffer.get_ref()) {
            drop(file);
            if let Err(cleanup) = std::fs::remove_file(path) {
                tracing::warn!("Failed to remove partial output {:?}: {}", path, cleanup);
            }
            return Err(encode_err(format!("Cannot write file: {}", e)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn codec() -> ImageCodec {
        ImageCodec::new(LimitsConfig::default())
    }

    #[test]
    fn test_select_format() {
        assert_eq!(select_format("a.jpg"), EncodeFormat::Jpeg);
        assert_eq!(select_format("a.JPEG"), EncodeFormat::Jpeg);
        assert_eq!(select_format("a.png"), EncodeFormat::Png);
        assert_eq!(select_format("a.Bmp"), EncodeFormat::Bmp);
        assert_eq!(select_format("a.tiff"), EncodeFormat::Tiff);
        assert_eq!(select_format("a.tif"), EncodeFormat::Jpeg);
        assert_eq!(select_format("noext"), EncodeFormat::Jpeg);
    }

    #[test]
    fn test_png_roundtrip_is_lossless_with_and_without_optimize() {
        let dir = tempfile::tempdir().unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(16, 8, |x, y| {
            Rgb([(x * 15) as u8, (y * 30) as u8, 77])
        }));

        for (name, options) in [
            ("base.png", EncodeOptions::baseline()),
            ("opt.png", EncodeOptions::optimized()),
        ] {
            let path = dir.path().join(name);
            codec().encode(&img, &path, EncodeFormat::Png, options).unwrap();
            let decoded = codec().decode(&path).unwrap();
            assert_eq!(decoded.as_bytes(), img.as_bytes());
        }
    }

    #[test]
    fn test_jpeg_encode_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.jpg");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 128])));

        codec()
            .encode(&img, &path, EncodeFormat::Jpeg, EncodeOptions::baseline())
            .unwrap();
        let decoded = codec().decode(&path).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!(decoded.dimensions(), (8, 8));
    }

    #[test]
    fn test_decode_detects_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("really_png.jpg");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
        codec()
            .encode(&img, &path, EncodeFormat::Png, EncodeOptions::baseline())
            .unwrap();

        let decoded = codec().decode(&path).unwrap();
        assert_eq!(decoded.as_bytes(), img.as_bytes());
    }

    #[test]
    fn test_decode_text_file_fails_with_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, "definitely not an image").unwrap();

        let err = codec().decode(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_decode_missing_file() {
        let err = codec().decode(Path::new("/nonexistent/x.png")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_decode_enforces_dimension_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        let img = DynamicImage::ImageRgb8(RgbImage::new(64, 2));
        codec()
            .encode(&img, &path, EncodeFormat::Png, EncodeOptions::baseline())
            .unwrap();

        let strict = ImageCodec::new(LimitsConfig {
            max_image_dimension: 32,
            ..LimitsConfig::default()
        });
        let err = strict.decode(&path).unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooLarge { width: 64, .. }));
    }

    #[test]
    fn test_rejected_raster_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("too_wide.jpg");
        let img = DynamicImage::ImageRgb8(RgbImage::new(70_000, 1));

        let err = codec()
            .encode(&img, &path, EncodeFormat::Jpeg, EncodeOptions::baseline())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encode { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_encode_into_missing_directory_fails() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let err = codec()
            .encode(
                &img,
                Path::new("/nonexistent/dir/out.bmp"),
                EncodeFormat::Bmp,
                EncodeOptions::baseline(),
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encode { .. }));
    }
}
