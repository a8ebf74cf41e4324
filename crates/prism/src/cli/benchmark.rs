//! The `prism benchmark` command: compare both strategies across variants.

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use prism_core::bench::{compare_strategies, BenchmarkHarness, Comparison, InputSource};
use prism_core::output::OutputWriter;
use prism_core::{Config, OutputFormat, TransformSpec};
use std::path::{Path, PathBuf};

use super::{expand_path, parse_dimensions, ReportFormat};

/// Arguments for the `benchmark` command.
#[derive(Args, Debug)]
pub struct BenchmarkArgs {
    /// Benchmark these images instead of generating a fresh set per run
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Iterations per variant (overrides config)
    #[arg(short = 'n', long)]
    pub iterations: Option<usize>,

    /// Number of generated images per run (overrides config)
    #[arg(long)]
    pub num_images: Option<usize>,

    /// Size of generated images as WIDTHxHEIGHT (overrides config)
    #[arg(long, value_parser = parse_dimensions)]
    pub image_size: Option<(u32, u32)>,

    /// JSON file with a list of transform variants (overrides config)
    #[arg(long)]
    pub params_file: Option<PathBuf>,

    /// Number of parallel workers (overrides config)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Scratch directory for generated inputs and outputs (overrides config)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Write raw benchmark records to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Record file format (defaults to the output file extension)
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Write the per-variant strategy comparison as JSON to this file
    #[arg(long)]
    pub comparison: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Execute the benchmark command.
pub async fn execute(args: BenchmarkArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&args, &mut config);
    config.validate()?;

    let variants = match &args.params_file {
        Some(path) => load_variants(&expand_path(path))?,
        None => config.benchmark.variants.clone(),
    };
    let iterations = config.benchmark.iterations;

    let input = match &args.input {
        Some(dir) => InputSource::Directory(expand_path(dir)),
        None => InputSource::from_config(&config),
    };

    let mut harness = BenchmarkHarness::new(&config, input)?;
    if let Some(dir) = &args.work_dir {
        harness = harness.with_work_dir(expand_path(dir));
    }
    tracing::info!(
        "Benchmarking {} variants x {} iterations in {:?}",
        variants.len(),
        iterations,
        harness.work_dir()
    );

    let progress = if args.no_progress {
        None
    } else {
        let total = BenchmarkHarness::expected_records(variants.len(), iterations);
        Some(create_progress_bar(total as u64))
    };
    if let Some(pb) = progress.clone() {
        harness = harness.on_record(move |record| {
            pb.inc(1);
            pb.set_message(format!(
                "variant {} iter {} {}",
                record.variant_index + 1,
                record.iteration + 1,
                record.strategy
            ));
        });
    }

    let records = harness.compare(&variants, iterations).await?;
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let comparisons = compare_strategies(&records);
    print_comparisons(&comparisons);

    if let Some(path) = &args.output {
        let path = expand_path(path);
        let format = args
            .format
            .map(OutputFormat::from)
            .unwrap_or_else(|| OutputFormat::from_path(&path));
        let mut writer = OutputWriter::create(&path, format, true)?;
        writer.write_all(&records)?;
        writer.finish()?;
        tracing::info!("{} records written to {:?}", records.len(), path);
    }

    if let Some(path) = &args.comparison {
        let path = expand_path(path);
        let mut writer = OutputWriter::create(&path, OutputFormat::Json, true)?;
        writer.write_all(&comparisons)?;
        writer.finish()?;
        tracing::info!("Comparison written to {:?}", path);
    }

    Ok(())
}

fn apply_overrides(args: &BenchmarkArgs, config: &mut Config) {
    if let Some(iterations) = args.iterations {
        config.benchmark.iterations = iterations;
    }
    if let Some(num_images) = args.num_images {
        config.benchmark.num_images = num_images;
    }
    if let Some(size) = args.image_size {
        config.benchmark.image_size = size;
    }
    if let Some(workers) = args.workers {
        config.processing.max_workers = workers;
    }
}

/// Read a JSON array of transform specs; missing fields take their defaults.
fn load_variants(path: &Path) -> anyhow::Result<Vec<TransformSpec>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read params file {}", path.display()))?;
    let variants: Vec<TransformSpec> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid params file {}", path.display()))?;
    if variants.is_empty() {
        anyhow::bail!("Params file {} contains no variants", path.display());
    }
    for (i, variant) in variants.iter().enumerate() {
        variant
            .validate()
            .with_context(|| format!("Variant {} in {}", i + 1, path.display()))?;
    }
    Ok(variants)
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} runs {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print the per-variant comparison table.
fn print_comparisons(comparisons: &[Comparison]) {
    eprintln!();
    eprintln!(
        "  {:<4} {:<11} {:>12} {:>12} {:>12} {:>9}",
        "#", "resize", "sequential", "parallel", "cpu (par)", "speedup"
    );
    eprintln!("  {}", "-".repeat(65));
    for c in comparisons {
        let (w, h) = c.variant.resize_dimensions;
        let speedup = c
            .speedup
            .map(|s| format!("{:.2}x", s))
            .unwrap_or_else(|| "n/a".to_string());
        eprintln!(
            "  {:<4} {:<11} {:>11.3}s {:>11.3}s {:>11.3}s {:>9}",
            c.variant_index + 1,
            format!("{}x{}", w, h),
            c.sequential.mean_wall_time.as_secs_f64(),
            c.parallel.mean_wall_time.as_secs_f64(),
            c.parallel.mean_cpu_time.as_secs_f64(),
            speedup
        );
    }
    eprintln!();
}
