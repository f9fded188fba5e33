//! Data structures shared across the asset pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::remap::ReferenceMap;

/// Kind of asset a package combines. The pipeline recognises exactly two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
  /// JavaScript sources, minified with the Closure Compiler.
  Js,
  /// Stylesheets, compressed with the YUI Compressor.
  Css,
}

impl AssetKind {
  /// File extension used for source and artifact files of this kind.
  pub fn extension(self) -> &'static str {
    match self {
      AssetKind::Js => "js",
      AssetKind::Css => "css",
    }
  }
}

impl FromStr for AssetKind {
  type Err = PipelineError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "js" => Ok(AssetKind::Js),
      "css" => Ok(AssetKind::Css),
      other => Err(PipelineError::UnsupportedKind {
        value: other.to_string(),
      }),
    }
  }
}

impl std::fmt::Display for AssetKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.extension())
  }
}

/// Optimization level forwarded to the JavaScript compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationLevel {
  /// Strip whitespace only.
  WhitespaceOnly,
  /// Safe renaming and dead code removal.
  #[default]
  SimpleOptimizations,
  /// Aggressive whole-program optimizations.
  AdvancedOptimizations,
}

impl OptimizationLevel {
  /// Value passed to the compiler's `--compilation_level` flag.
  pub fn flag(self) -> &'static str {
    match self {
      OptimizationLevel::WhitespaceOnly => "WHITESPACE_ONLY",
      OptimizationLevel::SimpleOptimizations => "SIMPLE_OPTIMIZATIONS",
      OptimizationLevel::AdvancedOptimizations => "ADVANCED_OPTIMIZATIONS",
    }
  }
}

/// Output formatting forwarded to the JavaScript compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputFormatting {
  /// Emit readable, indented output.
  PrettyPrint,
  /// Mark the boundary between input files in the output.
  PrintInputDelimiter,
}

impl OutputFormatting {
  /// Value passed to the compiler's `--formatting` flag.
  pub fn flag(self) -> &'static str {
    match self {
      OutputFormatting::PrettyPrint => "PRETTY_PRINT",
      OutputFormatting::PrintInputDelimiter => "PRINT_INPUT_DELIMITER",
    }
  }
}

/// How the orchestrator reacts when a single package fails to combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
  /// Log the failure, leave the package's references untouched and keep
  /// processing the remaining packages. The page still renders.
  #[default]
  BestEffort,
  /// Abort the render pass on the first package failure.
  FailFast,
}

/// A named, ordered group of source files combined into one artifact.
///
/// Packages are read from static configuration at startup and are immutable
/// during a render pass.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Package {
  /// Unique package name, used as the artifact file name prefix.
  pub name: String,
  /// Kind of asset the package combines.
  pub kind: AssetKind,
  /// Ordered public URLs of the source files.
  pub files: Vec<String>,
  /// Optional base URL override applied when resolving files to local paths.
  #[serde(default)]
  pub base_url: Option<String>,
  /// Global variables injected ahead of the combined sources (JS only).
  #[serde(default)]
  pub globals: BTreeMap<String, serde_json::Value>,
}

/// A package source file resolved against the local filesystem.
#[derive(Debug, Clone)]
pub struct SourceFile {
  /// Public URL the page referenced the file by.
  pub url: String,
  /// Resolved local path under the web root. May not exist.
  pub path: PathBuf,
}

/// Filesystem and URL layout the pipeline operates in.
#[derive(Debug, Clone)]
pub struct PipelineLayout {
  /// Local web root that public URLs resolve against.
  pub base_path: PathBuf,
  /// Public URL prefix the site is served under, usually empty.
  pub base_url: String,
  /// Directory combined artifacts are written to.
  pub assets_dir: PathBuf,
  /// Public URL prefix of the assets directory.
  pub assets_url: String,
  /// Scratch directory for concatenation temp files.
  pub scratch_dir: PathBuf,
}

/// Record of one artifact handled during a render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
  /// Package the artifact belongs to.
  pub package: String,
  /// Artifact file name under the assets directory.
  pub file_name: String,
  /// Whether an existing artifact was reused instead of regenerated.
  pub reused: bool,
}

/// Non-fatal diagnostic output captured from an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDiagnostics {
  /// Package that was being combined.
  pub package: String,
  /// Tool that produced the output.
  pub tool: String,
  /// Combined stdout and stderr text.
  pub output: String,
}

/// Failure of a single package, isolated under [`FailurePolicy::BestEffort`].
#[derive(Debug)]
pub struct PackageFailure {
  /// Package that failed to combine.
  pub package: String,
  /// The underlying error.
  pub error: PipelineError,
}

/// Outcome of one render pass over all declared packages.
#[derive(Debug, Default)]
pub struct PassReport {
  /// The page's reference list with combined artifacts substituted in.
  pub references: Vec<String>,
  /// Basename to artifact URL mapping built during the pass.
  pub map: ReferenceMap,
  /// Artifacts written or reused, one per combined package.
  pub artifacts: Vec<ArtifactRecord>,
  /// Diagnostic output captured from external tools.
  pub warnings: Vec<ToolDiagnostics>,
  /// Packages that failed and were skipped.
  pub failures: Vec<PackageFailure>,
}
