//! The fixed five-step transform chain.
//!
//! Steps always run in [`TransformStep::ORDER`]: resize, blur, sharpen,
//! contrast, brightness. Every step works on 8-bit RGB or RGBA; other pixel
//! layouts are converted first (grayscale becomes RGB). Alpha is carried
//! through unchanged by the enhancement steps.
//!
//! The enhancement steps share one primitive, [`blend`]: interpolate (or
//! extrapolate) every color sample between a degenerate image and the
//! original, `d + (o - d) * factor`. A factor of exactly `1.0` leaves the
//! raster bit-identical.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer};
use serde::Serialize;
use std::fmt;

use crate::error::TransformError;
use crate::types::TransformSpec;

/// SMOOTH 3x3 kernel used as the degenerate image for sharpening.
const SMOOTH_KERNEL: [u32; 9] = [1, 1, 1, 1, 5, 1, 1, 1, 1];
const SMOOTH_SCALE: u32 = 13;

/// One stage of the transform chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformStep {
    Resize,
    Blur,
    Sharpen,
    Contrast,
    Brightness,
}

impl TransformStep {
    /// Application order of the chain.
    pub const ORDER: [TransformStep; 5] = [
        TransformStep::Resize,
        TransformStep::Blur,
        TransformStep::Sharpen,
        TransformStep::Contrast,
        TransformStep::Brightness,
    ];

    /// Apply this step alone with its parameter taken from `spec`.
    pub fn apply(self, image: DynamicImage, spec: &TransformSpec) -> Result<DynamicImage, TransformError> {
        let image = normalize(image);
        match self {
            TransformStep::Resize => {
                let (width, height) = spec.resize_dimensions;
                if width == 0 || height == 0 {
                    return Err(TransformError::ZeroDimension);
                }
                Ok(image.resize_exact(width, height, FilterType::Lanczos3))
            }
            TransformStep::Blur => {
                let radius = check_factor("blur_radius", spec.blur_radius)?;
                if radius == 0.0 {
                    return Ok(image);
                }
                Ok(image.blur(radius as f32))
            }
            TransformStep::Sharpen => {
                let factor = check_factor("sharpen_factor", spec.sharpen_factor)?;
                enhance(image, factor, smooth)
            }
            TransformStep::Contrast => {
                let factor = check_factor("contrast_factor", spec.contrast_factor)?;
                enhance(image, factor, mean_gray)
            }
            TransformStep::Brightness => {
                let factor = check_factor("brightness_factor", spec.brightness_factor)?;
                enhance(image, factor, black)
            }
        }
    }
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformStep::Resize => "resize",
            TransformStep::Blur => "blur",
            TransformStep::Sharpen => "sharpen",
            TransformStep::Contrast => "contrast",
            TransformStep::Brightness => "brightness",
        };
        f.write_str(name)
    }
}

/// Runs every step of the chain in memory.
pub struct TransformChain;

impl TransformChain {
    /// Apply the full chain to `image`.
    ///
    /// The spec is validated before any pixel work. The result is checked to
    /// be exactly `spec.resize_dimensions` and non-empty.
    pub fn apply(image: DynamicImage, spec: &TransformSpec) -> Result<DynamicImage, TransformError> {
        spec.validate()?;
        let image = TransformStep::ORDER
            .iter()
            .try_fold(image, |img, step| step.apply(img, spec))?;
        check_raster(&image, spec)?;
        Ok(image)
    }
}

/// Check a raster against the dimensions a spec asked for.
pub fn check_raster(image: &DynamicImage, spec: &TransformSpec) -> Result<(), TransformError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidRaster("empty raster".to_string()));
    }
    if (width, height) != spec.resize_dimensions {
        return Err(TransformError::InvalidRaster(format!(
            "expected {}x{}, got {}x{}",
            spec.resize_dimensions.0, spec.resize_dimensions.1, width, height
        )));
    }
    Ok(())
}

fn check_factor(name: &'static str, value: f64) -> Result<f64, TransformError> {
    if !value.is_finite() {
        return Err(TransformError::NonFiniteFactor { name });
    }
    if value < 0.0 {
        return Err(TransformError::NegativeFactor { name, value });
    }
    Ok(value)
}

/// Convert any pixel layout to 8-bit RGB, or RGBA when alpha is present.
fn normalize(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.into_rgba8()),
        other => DynamicImage::ImageRgb8(other.into_rgb8()),
    }
}

/// Sample layout of a normalized raster.
#[derive(Clone, Copy)]
struct Layout {
    width: usize,
    height: usize,
    channels: usize,
}

impl Layout {
    /// Number of channels that carry color (alpha excluded).
    fn color_channels(&self) -> usize {
        self.channels.min(3)
    }
}

/// Blend `image` against the degenerate raster built by `degenerate`.
fn enhance(
    image: DynamicImage,
    factor: f64,
    degenerate: fn(&[u8], Layout) -> Vec<u8>,
) -> Result<DynamicImage, TransformError> {
    if factor == 1.0 {
        return Ok(image);
    }
    let (width, height) = image.dimensions();
    match image {
        DynamicImage::ImageRgb8(buf) => {
            let layout = Layout { width: width as usize, height: height as usize, channels: 3 };
            let mut data = buf.into_raw();
            let base = degenerate(&data, layout);
            blend(&mut data, &base, factor, layout);
            ImageBuffer::from_raw(width, height, data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| TransformError::InvalidRaster("buffer size mismatch".to_string()))
        }
        DynamicImage::ImageRgba8(buf) => {
            let layout = Layout { width: width as usize, height: height as usize, channels: 4 };
            let mut data = buf.into_raw();
            let base = degenerate(&data, layout);
            blend(&mut data, &base, factor, layout);
            ImageBuffer::from_raw(width, height, data)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(|| TransformError::InvalidRaster("buffer size mismatch".to_string()))
        }
        _ => Err(TransformError::InvalidRaster("unsupported pixel layout".to_string())),
    }
}

/// `out = d + (o - d) * factor`, rounded and clamped to `0..=255`, color samples only.
fn blend(original: &mut [u8], degenerate: &[u8], factor: f64, layout: Layout) {
    let color = layout.color_channels();
    for (pixel, base) in original
        .chunks_exact_mut(layout.channels)
        .zip(degenerate.chunks_exact(layout.channels))
    {
        for c in 0..color {
            let d = base[c] as f64;
            let o = pixel[c] as f64;
            pixel[c] = (d + (o - d) * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// 3x3 SMOOTH filter. Border pixels are copied unchanged.
fn smooth(data: &[u8], layout: Layout) -> Vec<u8> {
    let Layout { width, height, channels } = layout;
    let mut out = data.to_vec();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            for c in 0..layout.color_channels() {
                let mut sum = 0u32;
                for ky in 0..3 {
                    for kx in 0..3 {
                        let sx = x + kx - 1;
                        let sy = y + ky - 1;
                        sum += data[(sy * width + sx) * channels + c] as u32 * SMOOTH_KERNEL[ky * 3 + kx];
                    }
                }
                out[(y * width + x) * channels + c] = ((sum + SMOOTH_SCALE / 2) / SMOOTH_SCALE) as u8;
            }
        }
    }
    out
}

/// Uniform gray at the rounded mean luma of the image.
fn mean_gray(data: &[u8], layout: Layout) -> Vec<u8> {
    let pixels = layout.width * layout.height;
    let mut out = data.to_vec();
    if pixels == 0 {
        return out;
    }

    let total: u64 = data
        .chunks_exact(layout.channels)
        .map(|p| luma(p[0], p[1], p[2]) as u64)
        .sum();
    let mean = ((total as f64 / pixels as f64) + 0.5).floor().clamp(0.0, 255.0) as u8;

    for pixel in out.chunks_exact_mut(layout.channels) {
        pixel[..layout.color_channels()].fill(mean);
    }
    out
}

fn black(data: &[u8], _layout: Layout) -> Vec<u8> {
    vec![0; data.len()]
}

/// ITU-R 601-2 luma in 16.16 fixed point.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn test_identity_factors_preserve_pixels() {
        let img = gradient(40, 30);
        let spec = TransformSpec::resize_only(40, 30);
        for step in [TransformStep::Blur, TransformStep::Sharpen, TransformStep::Contrast, TransformStep::Brightness] {
            let out = step.apply(img.clone(), &spec).unwrap();
            assert_eq!(out.as_bytes(), img.as_bytes(), "{} changed pixels", step);
        }
    }

    #[test]
    fn test_resize_only_chain_solid_color() {
        let img = solid(100, 100, [200, 40, 90]);
        let out = TransformChain::apply(img, &TransformSpec::resize_only(50, 50)).unwrap();
        assert_eq!(out.dimensions(), (50, 50));
        let rgb = out.to_rgb8();
        assert!(rgb.pixels().all(|p| *p == Rgb([200, 40, 90])));
    }

    #[test]
    fn test_chain_output_matches_target_dimensions() {
        let out = TransformChain::apply(gradient(64, 48), &TransformSpec::default()).unwrap();
        assert_eq!(out.dimensions(), (800, 600));
    }

    #[test]
    fn test_brightness_zero_is_black() {
        let spec = TransformSpec {
            brightness_factor: 0.0,
            ..TransformSpec::resize_only(8, 8)
        };
        let out = TransformStep::Brightness.apply(gradient(8, 8), &spec).unwrap();
        assert!(out.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_brightness_clamps() {
        let spec = TransformSpec {
            brightness_factor: 2.0,
            ..TransformSpec::resize_only(4, 4)
        };
        let out = TransformStep::Brightness
            .apply(solid(4, 4, [200, 100, 0]), &spec)
            .unwrap();
        assert!(out.to_rgb8().pixels().all(|p| *p == Rgb([255, 200, 0])));
    }

    #[test]
    fn test_contrast_zero_is_mean_gray() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        }));
        let spec = TransformSpec {
            contrast_factor: 0.0,
            ..TransformSpec::resize_only(2, 1)
        };
        let out = TransformStep::Contrast.apply(img, &spec).unwrap();
        // mean luma 127.5 rounds up
        assert!(out.to_rgb8().pixels().all(|p| *p == Rgb([128, 128, 128])));
    }

    #[test]
    fn test_sharpen_leaves_borders_and_flat_regions() {
        let spec = TransformSpec {
            sharpen_factor: 3.0,
            ..TransformSpec::resize_only(10, 10)
        };
        let flat = solid(10, 10, [90, 90, 90]);
        let out = TransformStep::Sharpen.apply(flat.clone(), &spec).unwrap();
        assert_eq!(out.as_bytes(), flat.as_bytes());

        let img = gradient(10, 10);
        let out = TransformStep::Sharpen.apply(img.clone(), &spec).unwrap().to_rgb8();
        let src = img.to_rgb8();
        for x in 0..10 {
            assert_eq!(out.get_pixel(x, 0), src.get_pixel(x, 0));
            assert_eq!(out.get_pixel(x, 9), src.get_pixel(x, 9));
        }
    }

    #[test]
    fn test_alpha_survives_enhancement() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 6, Rgba([100, 150, 200, 77])));
        let spec = TransformSpec {
            brightness_factor: 0.5,
            ..TransformSpec::resize_only(6, 6)
        };
        let out = TransformStep::Brightness.apply(img, &spec).unwrap().to_rgba8();
        assert!(out.pixels().all(|p| *p == Rgba([50, 75, 100, 77])));
    }

    #[test]
    fn test_grayscale_input_becomes_rgb() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([60])));
        let out = TransformChain::apply(img, &TransformSpec::resize_only(10, 10)).unwrap();
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_negative_factor_rejected_before_work() {
        let spec = TransformSpec {
            sharpen_factor: -1.0,
            ..TransformSpec::default()
        };
        let err = TransformChain::apply(gradient(4, 4), &spec).unwrap_err();
        assert_eq!(
            err,
            TransformError::NegativeFactor { name: "sharpen_factor", value: -1.0 }
        );
        let err = TransformStep::Sharpen.apply(gradient(4, 4), &spec).unwrap_err();
        assert!(matches!(err, TransformError::NegativeFactor { .. }));
    }

    #[test]
    fn test_check_raster_dimension_mismatch() {
        let err = check_raster(&gradient(5, 5), &TransformSpec::resize_only(6, 5)).unwrap_err();
        assert!(matches!(err, TransformError::InvalidRaster(_)));
    }

    #[test]
    fn test_luma_extremes() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
    }
}
