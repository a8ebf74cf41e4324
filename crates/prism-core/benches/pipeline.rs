//! Benchmarks for the Prism transform pipeline.
//!
//! Run with: cargo bench -p prism-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::DynamicImage;
use prism_core::bench::TestPattern;
use prism_core::config::{Config, LimitsConfig};
use prism_core::pipeline::{EncodeFormat, EncodeOptions, ImageCodec, ImageProcessor, TransformStep};
use prism_core::{TransformChain, TransformSpec};

fn pattern_image(pattern: TestPattern, width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(pattern.render(width, height, 42))
}

fn benchmark_transform_chain(c: &mut Criterion) {
    let img = pattern_image(TestPattern::Circles, 1280, 720);
    let spec = TransformSpec::default();

    c.bench_function("transform_chain_1280x720", |b| {
        b.iter(|| {
            let _ = TransformChain::apply(black_box(img.clone()), &spec);
        })
    });
}

fn benchmark_enhance_steps(c: &mut Criterion) {
    let img = pattern_image(TestPattern::Noise, 800, 600);
    let spec = TransformSpec::default();

    let mut group = c.benchmark_group("step_800x600");
    for step in [TransformStep::Sharpen, TransformStep::Contrast, TransformStep::Brightness] {
        group.bench_function(step.to_string(), |b| {
            b.iter(|| {
                let _ = step.apply(black_box(img.clone()), &spec);
            })
        });
    }
    group.finish();
}

fn benchmark_codec_roundtrip(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let codec = ImageCodec::new(LimitsConfig::default());
    let img = pattern_image(TestPattern::Gradient, 800, 600);

    let mut group = c.benchmark_group("codec_roundtrip_800x600");
    for (name, format, options) in [
        ("jpeg", EncodeFormat::Jpeg, EncodeOptions::baseline()),
        ("png", EncodeFormat::Png, EncodeOptions::baseline()),
        ("png_optimized", EncodeFormat::Png, EncodeOptions::optimized()),
    ] {
        let path = dir.path().join(format!("bench_{}", name));
        group.bench_function(name, |b| {
            b.iter(|| {
                codec.encode(black_box(&img), &path, format, options).unwrap();
                let _ = codec.decode(&path);
            })
        });
    }
    group.finish();
}

fn benchmark_single_file(c: &mut Criterion) {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    prism_core::bench::generate_test_images(input.path(), 1, (1280, 720)).unwrap();

    let processor = ImageProcessor::new(&Config::default());
    let asset = processor.discover(input.path()).remove(0);
    let spec = TransformSpec::default();

    let mut group = c.benchmark_group("single_file_1280x720");
    group.sample_size(10);
    group.bench_function("singlepass", |b| {
        b.iter(|| {
            let _ = processor.process_singlepass(black_box(&asset), output.path(), &spec);
        })
    });
    group.bench_function("multipass", |b| {
        b.iter(|| {
            let _ = processor.process_multipass(black_box(&asset), output.path(), &spec);
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_transform_chain,
    benchmark_enhance_steps,
    benchmark_codec_roundtrip,
    benchmark_single_file,
);
criterion_main!(benches);
