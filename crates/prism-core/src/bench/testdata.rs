//! Synthetic benchmark inputs.
//!
//! Images are written as PNG and named `test_image_<n>_<pattern>.png`, with
//! `n` starting at 1 and the pattern cycling through [`TestPattern::ALL`].

use image::{DynamicImage, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

use crate::config::LimitsConfig;
use crate::error::Result;
use crate::pipeline::codec::{EncodeFormat, EncodeOptions, ImageCodec};

const CHECKER_BOX: u32 = 100;
const CIRCLE_STEP: f64 = 50.0;
const LINE_SPACING: i64 = 50;
const STROKE: f64 = 2.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Content of a generated test image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPattern {
    /// Horizontal black-to-white ramp
    Gradient,
    /// Alternating 100 px boxes
    Checkerboard,
    /// Concentric rings every 50 px
    Circles,
    /// Uniform random RGB
    Noise,
    /// Diagonal lines every 50 px
    Lines,
}

impl TestPattern {
    pub const ALL: [TestPattern; 5] = [
        TestPattern::Gradient,
        TestPattern::Checkerboard,
        TestPattern::Circles,
        TestPattern::Noise,
        TestPattern::Lines,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TestPattern::Gradient => "gradient",
            TestPattern::Checkerboard => "checkerboard",
            TestPattern::Circles => "circles",
            TestPattern::Noise => "noise",
            TestPattern::Lines => "lines",
        }
    }

    /// Render the pattern. `seed` only affects [`TestPattern::Noise`].
    pub fn render(self, width: u32, height: u32, seed: u64) -> RgbImage {
        match self {
            TestPattern::Gradient => RgbImage::from_fn(width, height, |x, _| {
                let v = (x as u64 * 255 / width.max(1) as u64) as u8;
                Rgb([v, v, v])
            }),
            TestPattern::Checkerboard => RgbImage::from_fn(width, height, |x, y| {
                if (x / CHECKER_BOX + y / CHECKER_BOX) % 2 == 0 {
                    BLACK
                } else {
                    WHITE
                }
            }),
            TestPattern::Circles => {
                let (cx, cy) = ((width / 2) as f64, (height / 2) as f64);
                let max_radius = (width.min(height) / 2) as f64;
                RgbImage::from_fn(width, height, |x, y| {
                    let d = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
                    let to_ring = CIRCLE_STEP - d % CIRCLE_STEP;
                    if d < max_radius && to_ring <= STROKE && d > 0.0 {
                        BLACK
                    } else {
                        WHITE
                    }
                })
            }
            TestPattern::Noise => {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut img = RgbImage::new(width, height);
                for pixel in img.pixels_mut() {
                    *pixel = Rgb(rng.gen());
                }
                img
            }
            TestPattern::Lines => RgbImage::from_fn(width, height, |x, y| {
                let offset = (x as i64 - y as i64 + height as i64).rem_euclid(LINE_SPACING);
                if (offset as f64) < STROKE {
                    BLACK
                } else {
                    WHITE
                }
            }),
        }
    }
}

/// Write `count` test images of `size` into `dir`, creating it if needed.
///
/// Returns the written paths in generation order.
pub fn generate_test_images(dir: &Path, count: usize, size: (u32, u32)) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let codec = ImageCodec::new(LimitsConfig::default());
    let (width, height) = size;

    let mut written = Vec::with_capacity(count);
    for i in 0..count {
        let pattern = TestPattern::ALL[i % TestPattern::ALL.len()];
        let path = dir.join(format!("test_image_{}_{}.png", i + 1, pattern.name()));
        let image = DynamicImage::ImageRgb8(pattern.render(width, height, i as u64));
        codec.encode(&image, &path, EncodeFormat::Png, EncodeOptions::baseline())?;
        tracing::debug!("Generated test image: {:?}", path);
        written.push(path);
    }

    tracing::info!("Generated {} test images ({}x{}) in {:?}", count, width, height, dir);
    Ok(written)
}
