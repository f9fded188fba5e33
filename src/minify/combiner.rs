//! Combine-and-minify step for a single package.

use std::collections::BTreeMap;
use std::path::Path;

use log::warn;

use crate::cache::{artifact_exists, artifact_path};
use crate::error::{PipelineError, PipelineResult};
use crate::minify::concat::join_sources;
use crate::minify::tool::MinifierTool;
use crate::models::{AssetKind, OptimizationLevel, SourceFile};

/// Outcome of one combine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombineStatus {
  /// The fingerprinted artifact already existed; nothing was invoked.
  Reused,
  /// A new artifact was written, with any diagnostics the tool emitted.
  Written {
    /// Non-empty tool output surfaced as a warning, never fatal.
    diagnostics: Option<String>,
  },
}

/// Produces combined artifacts in the assets directory.
#[derive(Debug)]
pub struct Combiner<'a> {
  assets_dir: &'a Path,
  scratch_dir: &'a Path,
  base_url: &'a str,
  level: OptimizationLevel,
}

impl<'a> Combiner<'a> {
  /// Create a combiner writing into `assets_dir` via `scratch_dir`.
  pub fn new(
    assets_dir: &'a Path,
    scratch_dir: &'a Path,
    base_url: &'a str,
    level: OptimizationLevel,
  ) -> Self {
    Self {
      assets_dir,
      scratch_dir,
      base_url,
      level,
    }
  }

  /// Combine `sources` into `<assets_dir>/<out_file>` using `tool`.
  ///
  /// Short-circuits on a cache hit without touching the tool. The tool writes
  /// into the scratch directory and the finished artifact is renamed into
  /// place, so concurrent render passes sharing the assets directory never
  /// observe a partially written file. The scratch directory must live on the
  /// same filesystem as the assets directory for the rename to succeed.
  pub fn combine(
    &self,
    tool: &dyn MinifierTool,
    package: &str,
    kind: AssetKind,
    sources: &[SourceFile],
    globals: &BTreeMap<String, serde_json::Value>,
    out_file: &str,
  ) -> PipelineResult<CombineStatus> {
    if artifact_exists(self.assets_dir, out_file) {
      return Ok(CombineStatus::Reused);
    }

    if sources.is_empty() {
      return Err(PipelineError::NoInputFiles {
        package: package.to_string(),
      });
    }

    std::fs::create_dir_all(self.scratch_dir)?;
    std::fs::create_dir_all(self.assets_dir)?;

    let joined = join_sources(kind, sources, globals, self.base_url, self.scratch_dir)?;
    let staged = tempfile::Builder::new()
      .prefix("minified-")
      .suffix(&format!(".{}", kind.extension()))
      .tempfile_in(self.scratch_dir)?
      .into_temp_path();

    let output = tool.run(joined.path(), &staged, self.level)?;

    staged
      .persist(artifact_path(self.assets_dir, out_file))
      .map_err(|err| PipelineError::Io(err.error))?;

    let diagnostics = if output.diagnostics.is_empty() {
      None
    } else {
      warn!(
        "minifier '{}' reported for package '{package}': {}",
        tool.name(),
        output.diagnostics
      );
      Some(output.diagnostics)
    };

    Ok(CombineStatus::Written { diagnostics })
  }
}
