//! The `prism profile` command: one measured run plus JSON and Markdown reports.

use clap::Args;
use prism_core::output::OutputWriter;
use prism_core::{build_pipeline, Config, OutputFormat, Profiler};
use std::path::PathBuf;

use super::{expand_path, StrategyArg, TransformArgs};

/// Arguments for the `profile` command.
#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Directory containing input images
    pub input: PathBuf,

    /// Directory for processed images and the reports
    #[arg(short, long)]
    pub output: PathBuf,

    /// Strategy to profile
    #[arg(short, long, value_enum, default_value = "sequential")]
    pub strategy: StrategyArg,

    /// Number of parallel workers (overrides config)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub transform: TransformArgs,
}

/// Execute the profile command.
pub async fn execute(args: ProfileArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(workers) = args.workers {
        config.processing.max_workers = workers;
    }
    config.validate()?;
    let spec = args.transform.apply(config.transform)?;
    let input = expand_path(&args.input);
    let output = expand_path(&args.output);

    let pipeline = build_pipeline(args.strategy.into(), &config)?;
    let report = Profiler::profile(
        pipeline.as_ref(),
        &input,
        &output.join("processed_images"),
        &spec,
    )
    .await?;

    let stamp = report.timestamp.format("%Y%m%d_%H%M%S").to_string();
    let data_path = output.join(format!("profile_data_{}.json", stamp));
    let mut writer = OutputWriter::create(&data_path, OutputFormat::Json, true)?;
    writer.write(&report)?;
    writer.finish()?;

    let markdown_path = output.join(format!("analysis_report_{}.md", stamp));
    std::fs::write(&markdown_path, report.to_markdown())?;

    eprintln!(
        "Profiled {} images ({} failed) in {:.2}s",
        report.succeeded + report.failed,
        report.failed,
        report.execution_time.as_secs_f64()
    );
    println!("{}", data_path.display());
    println!("{}", markdown_path.display());
    Ok(())
}
