//! Argument types shared by several subcommands.

use clap::{Args, ValueEnum};
use prism_core::{OutputFormat, Strategy, TransformSpec};
use std::path::{Path, PathBuf};

/// Execution strategy.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    /// Single thread, decode/encode around every step (baseline)
    Sequential,
    /// Worker pool, one decode and one encode per file
    Parallel,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => Strategy::Sequential,
            StrategyArg::Parallel => Strategy::Parallel,
        }
    }
}

/// Report file format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => OutputFormat::Json,
            ReportFormat::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Per-run overrides of the configured `[transform]` section.
#[derive(Args, Debug, Default, Clone)]
pub struct TransformArgs {
    /// Resize target as WIDTHxHEIGHT (or WIDTH,HEIGHT)
    #[arg(long, value_parser = parse_dimensions)]
    pub resize: Option<(u32, u32)>,

    /// Gaussian blur radius (0 disables blur)
    #[arg(long)]
    pub blur: Option<f64>,

    /// Sharpness factor (1.0 = unchanged)
    #[arg(long)]
    pub sharpen: Option<f64>,

    /// Contrast factor (1.0 = unchanged)
    #[arg(long)]
    pub contrast: Option<f64>,

    /// Brightness factor (1.0 = unchanged)
    #[arg(long)]
    pub brightness: Option<f64>,
}

impl TransformArgs {
    /// Overlay the given flags on `base` and validate the result.
    pub fn apply(&self, base: TransformSpec) -> anyhow::Result<TransformSpec> {
        let spec = TransformSpec {
            resize_dimensions: self.resize.unwrap_or(base.resize_dimensions),
            blur_radius: self.blur.unwrap_or(base.blur_radius),
            sharpen_factor: self.sharpen.unwrap_or(base.sharpen_factor),
            contrast_factor: self.contrast.unwrap_or(base.contrast_factor),
            brightness_factor: self.brightness.unwrap_or(base.brightness_factor),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Parse `800x600` or `800,600`.
pub fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X', ','])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid dimension '{}': {}", v, e))
    };
    let dims = (parse(w)?, parse(h)?);
    if dims.0 == 0 || dims.1 == 0 {
        return Err("dimensions must be positive".to_string());
    }
    Ok(dims)
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}
