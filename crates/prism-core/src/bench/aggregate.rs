//! Derived statistics over raw benchmark records.
//!
//! Everything here reads `&[BenchmarkRecord]`; the raw records are never
//! modified.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::{serialize_secs, Strategy, TransformSpec};

use super::harness::BenchmarkRecord;

/// Means across iterations for one (variant, strategy) pair.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateStats {
    pub variant_index: usize,
    pub variant: TransformSpec,
    pub strategy: Strategy,
    /// Number of iterations aggregated
    pub runs: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub mean_wall_time: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub mean_cpu_time: Duration,
    /// Mean batch memory delta in bytes
    pub mean_memory_delta: f64,
    #[serde(serialize_with = "serialize_secs")]
    pub mean_time_per_file: Duration,
    /// Totals over all iterations
    pub succeeded: usize,
    pub failed: usize,
}

/// Sequential vs parallel for one variant.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub variant_index: usize,
    pub variant: TransformSpec,
    pub sequential: AggregateStats,
    pub parallel: AggregateStats,
    /// Sequential mean wall time over parallel mean wall time
    pub speedup: Option<f64>,
}

/// Group records by (variant, strategy) and average them.
///
/// Output is ordered by variant index, sequential before parallel.
pub fn aggregate(records: &[BenchmarkRecord]) -> Vec<AggregateStats> {
    let mut groups: BTreeMap<(usize, Strategy), Vec<&BenchmarkRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.variant_index, record.strategy))
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .filter_map(|((variant_index, strategy), group)| {
            let first = group.first()?;
            let runs = group.len();
            let mean = |f: fn(&BenchmarkRecord) -> Duration| {
                group.iter().map(|r| f(r)).sum::<Duration>() / runs as u32
            };

            Some(AggregateStats {
                variant_index,
                variant: first.variant,
                strategy,
                runs,
                mean_wall_time: mean(|r| r.resources.wall_time),
                mean_cpu_time: mean(|r| r.resources.cpu_time),
                mean_memory_delta: group.iter().map(|r| r.resources.memory_delta as f64).sum::<f64>()
                    / runs as f64,
                mean_time_per_file: mean(|r| r.summary.average_per_file),
                succeeded: group.iter().map(|r| r.summary.succeeded).sum(),
                failed: group.iter().map(|r| r.summary.failed).sum(),
            })
        })
        .collect()
}

/// Pair up sequential and parallel aggregates per variant.
///
/// Variants missing either strategy are skipped.
pub fn compare_strategies(records: &[BenchmarkRecord]) -> Vec<Comparison> {
    let mut by_variant: BTreeMap<usize, (Option<AggregateStats>, Option<AggregateStats>)> = BTreeMap::new();
    for stats in aggregate(records) {
        let slot = by_variant.entry(stats.variant_index).or_default();
        match stats.strategy {
            Strategy::Sequential => slot.0 = Some(stats),
            Strategy::Parallel => slot.1 = Some(stats),
        }
    }

    by_variant
        .into_iter()
        .filter_map(|(variant_index, pair)| match pair {
            (Some(sequential), Some(parallel)) => {
                let par = parallel.mean_wall_time.as_secs_f64();
                let speedup = (par > 0.0).then(|| sequential.mean_wall_time.as_secs_f64() / par);
                Some(Comparison {
                    variant_index,
                    variant: sequential.variant,
                    sequential,
                    parallel,
                    speedup,
                })
            }
            _ => None,
        })
        .collect()
}
