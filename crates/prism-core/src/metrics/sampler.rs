//! Before/after sampling of this process's wall time, CPU time and resident memory.
//!
//! The sampler keeps no state between calls: every [`ResourceSampler::measure`]
//! takes its own pair of snapshots, so concurrent measurements never share
//! counters.

use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::types::serialize_secs;

/// Process counters captured at one instant.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSnapshot {
    pub taken_at: Instant,
    /// User + system CPU time consumed by the process so far
    pub cpu_time: Duration,
    /// Resident set size in bytes
    pub resident_memory: u64,
}

impl ResourceSnapshot {
    /// Difference between this snapshot and an earlier one.
    pub fn delta_since(&self, before: &ResourceSnapshot) -> ResourceDelta {
        ResourceDelta {
            wall_time: self.taken_at.saturating_duration_since(before.taken_at),
            cpu_time: self.cpu_time.saturating_sub(before.cpu_time),
            memory_delta: self.resident_memory as i64 - before.resident_memory as i64,
        }
    }
}

/// Resources consumed by one measured unit of work.
///
/// `memory_delta` is signed: the allocator may hand pages back while the unit
/// runs, so callers must not assume growth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResourceDelta {
    #[serde(serialize_with = "serialize_secs")]
    pub wall_time: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub cpu_time: Duration,
    /// Resident memory change in bytes
    pub memory_delta: i64,
}

/// Stateless process resource sampler.
pub struct ResourceSampler;

impl ResourceSampler {
    /// Read the current process counters.
    ///
    /// Counters that the platform cannot report read as zero.
    pub fn snapshot() -> ResourceSnapshot {
        let taken_at = Instant::now();
        let (cpu_time, resident_memory) = read_process_counters();
        ResourceSnapshot {
            taken_at,
            cpu_time,
            resident_memory,
        }
    }

    /// Run `f` between two snapshots and return its result with the delta.
    pub fn measure<F, R>(f: F) -> (R, ResourceDelta)
    where
        F: FnOnce() -> R,
    {
        let before = Self::snapshot();
        let result = f();
        let delta = Self::snapshot().delta_since(&before);
        (result, delta)
    }

    /// Async variant of [`measure`](Self::measure).
    ///
    /// Snapshots are taken by the awaiting task, so when the future fans work
    /// out to a worker pool the measurement brackets the whole parallel region.
    pub async fn measure_async<F>(fut: F) -> (F::Output, ResourceDelta)
    where
        F: Future,
    {
        let before = Self::snapshot();
        let result = fut.await;
        let delta = Self::snapshot().delta_since(&before);
        (result, delta)
    }
}

fn read_process_counters() -> (Duration, u64) {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return (Duration::ZERO, 0);
    };

    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        false,
        ProcessRefreshKind::nothing().with_memory().with_cpu(),
    );

    match sys.process(pid) {
        Some(process) => (
            Duration::from_millis(process.accumulated_cpu_time()),
            process.memory(),
        ),
        None => {
            tracing::trace!("Current process not visible to sysinfo");
            (Duration::ZERO, 0)
        }
    }
}
