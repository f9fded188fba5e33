#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod hosts;
pub mod minify;
pub mod models;
pub mod pipeline;
pub mod remap;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use models::{
  AssetKind, FailurePolicy, OptimizationLevel, OutputFormatting, Package, PassReport,
  PipelineLayout,
};
pub use pipeline::AssetPipeline;
pub use remap::ReferenceMap;
