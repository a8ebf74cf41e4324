//! Image processing pipeline components.
//!
//! - **discovery**: find supported images in an input directory
//! - **validate**: cheap checks before a full decode
//! - **codec**: decode files, encode rasters, output format policy
//! - **transform**: the five-step transform chain
//! - **processor**: single-file routines (single-pass and multi-pass)
//! - **pool**: bounded worker pool with failure isolation
//! - **strategy**: the `Pipeline` trait
//! - **sequential** / **parallel**: the two execution strategies

pub mod codec;
pub mod discovery;
pub mod parallel;
pub mod pool;
pub mod processor;
pub mod sequential;
pub mod strategy;
pub mod transform;
pub mod validate;

pub use codec::{select_format, AssetFormat, EncodeFormat, EncodeOptions, ImageCodec};
pub use discovery::{FileDiscovery, ImageAsset};
pub use parallel::ParallelPipeline;
pub use pool::{WorkerPool, DEFAULT_MAX_WORKERS};
pub use processor::ImageProcessor;
pub use sequential::SequentialPipeline;
pub use strategy::{build_pipeline, Pipeline};
pub use transform::{TransformChain, TransformStep};
pub use validate::Validator;
