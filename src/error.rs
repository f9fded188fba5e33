//! Error types for the asset pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while combining and minifying page assets.
#[derive(Error, Debug)]
pub enum PipelineError {
  /// A required external tool is missing or cannot be run. Raised during
  /// pipeline construction; there is no degraded mode without the tools.
  #[error("external tool '{name}' at {} is missing or not runnable", .path.display())]
  ToolNotExecutable {
    /// Human readable tool name.
    name: String,
    /// Configured location of the executable or jar.
    path: PathBuf,
  },

  /// An asset kind string was neither `js` nor `css`.
  #[error("unsupported asset kind '{value}', expected 'js' or 'css'")]
  UnsupportedKind {
    /// The rejected input value.
    value: String,
  },

  /// A package resolved to zero input files after exclusions, which is a
  /// caller error distinct from a package whose files are simply absent.
  #[error("package '{package}' resolved to zero input files")]
  NoInputFiles {
    /// Name of the offending package.
    package: String,
  },

  /// The external minifier exited with a non-zero status.
  #[error("minifier '{tool}' exited with status {status}: {diagnostics}")]
  MinifierFailed {
    /// Tool that failed.
    tool: String,
    /// Exit status code, `-1` when terminated by a signal.
    status: i32,
    /// Combined stdout and stderr captured from the tool.
    diagnostics: String,
  },

  /// The external minifier did not finish within the configured timeout.
  #[error("minifier '{tool}' did not finish within {seconds}s")]
  Timeout {
    /// Tool that was killed.
    tool: String,
    /// Configured timeout in seconds.
    seconds: u64,
  },

  /// IO error on a source, scratch or output file.
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  /// JSON serialization error while emitting injected globals.
  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}
