//! The `prism process` command.

use clap::Args;
use prism_core::output::OutputWriter;
use prism_core::{build_pipeline, BatchSummary, Config, OutputFormat, Strategy};
use std::path::PathBuf;

use super::{expand_path, StrategyArg, TransformArgs};

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Directory containing input images
    pub input: PathBuf,

    /// Directory for processed images (created if missing)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Execution strategy
    #[arg(short, long, value_enum, default_value = "parallel")]
    pub strategy: StrategyArg,

    /// Number of parallel workers (overrides config)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub transform: TransformArgs,

    /// Write the batch summary as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(workers) = args.workers {
        config.processing.max_workers = workers;
    }
    config.validate()?;
    let spec = args.transform.apply(config.transform)?;
    let strategy: Strategy = args.strategy.into();
    let input = expand_path(&args.input);
    let output = expand_path(&args.output);

    let pipeline = build_pipeline(strategy, &config)?;
    tracing::info!(
        "Processing {:?} -> {:?} ({}, resize {}x{})",
        input,
        output,
        strategy,
        spec.resize_dimensions.0,
        spec.resize_dimensions.1
    );

    let summary = pipeline.process(&input, &output, &spec).await?;
    print_summary(&summary);

    if let Some(report) = args.report {
        let path = expand_path(&report);
        let mut writer = OutputWriter::create(&path, OutputFormat::Json, true)?;
        writer.write(&summary)?;
        writer.finish()?;
        tracing::info!("Summary written to {:?}", path);
    }

    if summary.succeeded == 0 {
        anyhow::bail!("All {} images failed to process", summary.failed);
    }
    Ok(())
}

/// Print a formatted summary table after batch processing.
fn print_summary(summary: &BatchSummary) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("           {} summary", summary.strategy);
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.total());
    eprintln!("    Duration:     {:>7.2}s", summary.total_elapsed.as_secs_f64());
    eprintln!("    Per image:    {:>7.3}s", summary.average_per_file.as_secs_f64());
    eprintln!(
        "    Peak memory:  {:>7.1} MB",
        summary.peak_memory_delta as f64 / (1024.0 * 1024.0)
    );
    eprintln!("  ====================================");

    for failure in summary.failures() {
        eprintln!(
            "    ! {}: {}",
            failure.filename,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
}
