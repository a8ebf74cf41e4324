//! Host-wide CPU and memory figures.

use serde::Serialize;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

/// Host resources at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    /// Logical CPU count
    pub cpu_count: usize,
    /// Global CPU utilisation in percent
    pub cpu_percent: f32,
    /// Total RAM in bytes
    pub memory_total: u64,
    /// Available RAM in bytes
    pub memory_available: u64,
}

impl SystemInfo {
    /// Sample host resources.
    ///
    /// Blocks for `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` because CPU usage is
    /// computed from two readings; call from a blocking context.
    pub fn sample() -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();

        let cpu_count = match sys.cpus().len() {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };

        Self {
            cpu_count,
            cpu_percent: sys.global_cpu_usage(),
            memory_total: sys.total_memory(),
            memory_available: sys.available_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_reports_cpus() {
        let info = SystemInfo::sample();
        assert!(info.cpu_count >= 1);
        assert!(info.memory_available <= info.memory_total);
    }
}
