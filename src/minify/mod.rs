//! Combination and minification of package sources through external tools.

mod combiner;
mod concat;
mod tool;

pub use combiner::{CombineStatus, Combiner};
pub use concat::join_sources;
pub use tool::{ClosureCompiler, MinifierTool, ToolOutput, YuiCompressor};
