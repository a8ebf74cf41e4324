//! Prism CLI - batch image transformation with sequential vs. parallel benchmarking.
//!
//! # Usage
//!
//! ```bash
//! # Transform every image in a directory
//! prism process ./photos -o ./processed --strategy parallel
//!
//! # Compare both strategies over the configured variants
//! prism benchmark --iterations 3 --output records.jsonl
//!
//! # Profile one run and write JSON + Markdown reports
//! prism profile ./photos -o ./profiling
//!
//! # View configuration
//! prism config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Prism - batch image transformation with strategy benchmarking.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "PRISM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply the transform chain to every image in a directory
    Process(cli::process::ProcessArgs),

    /// Compare the sequential and parallel strategies
    Benchmark(cli::benchmark::BenchmarkArgs),

    /// Profile a single run and write an analysis report
    Profile(cli::profile::ProfileArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let loaded = match &cli.config {
        Some(path) => prism_core::Config::load_from(&cli::expand_path(path)),
        None => prism_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => return Err(e.into()),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `prism config path`."
            );
            prism_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Prism v{}", prism_core::VERSION);

    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config).await,
        Commands::Benchmark(args) => cli::benchmark::execute(args, config).await,
        Commands::Profile(args) => cli::profile::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, &config),
    }
}
