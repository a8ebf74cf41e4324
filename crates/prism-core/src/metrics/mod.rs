//! Process and system resource measurement.
//!
//! - **sampler**: point-in-time process counters and before/after deltas
//! - **system**: host-wide CPU and memory figures for profiling reports

pub mod sampler;
pub mod system;

pub use sampler::{ResourceDelta, ResourceSampler, ResourceSnapshot};
pub use system::SystemInfo;
