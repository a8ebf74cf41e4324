//! Benchmarking: synthetic inputs, the comparison harness and aggregation.

pub mod aggregate;
pub mod harness;
pub mod testdata;

pub use aggregate::{aggregate, compare_strategies, AggregateStats, Comparison};
pub use harness::{BenchmarkHarness, BenchmarkRecord, InputSource, RecordCallback};
pub use testdata::{generate_test_images, TestPattern};
