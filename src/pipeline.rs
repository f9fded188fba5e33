//! Render-pass orchestration across the declared packages.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};

use crate::cache::artifact_file_name;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::fingerprint::package_fingerprint;
use crate::hosts::HostRotation;
use crate::minify::{ClosureCompiler, CombineStatus, Combiner, MinifierTool, YuiCompressor};
use crate::models::{
  ArtifactRecord, AssetKind, FailurePolicy, OptimizationLevel, Package, PackageFailure,
  PassReport, PipelineLayout, SourceFile, ToolDiagnostics,
};
use crate::remap::{ReferenceMap, basename};

/// Asset combination pipeline, driven once per page render pass.
///
/// The host render pipeline calls [`AssetPipeline::run`] at one hook point:
/// after the page's script and style references are declared and before they
/// are emitted. The returned [`PassReport`] carries the rewritten reference
/// list along with everything that happened during the pass.
pub struct AssetPipeline {
  layout: PipelineLayout,
  js_tool: Box<dyn MinifierTool>,
  css_tool: Box<dyn MinifierTool>,
  level: OptimizationLevel,
  exclude: BTreeSet<String>,
  skip_combined_urls: bool,
  policy: FailurePolicy,
  hosts: HostRotation,
}

/// Everything a successfully combined package contributes to the pass.
struct PackageOutcome {
  artifact: ArtifactRecord,
  tool: String,
  diagnostics: Option<String>,
  mapped: Vec<String>,
  url: String,
}

impl AssetPipeline {
  /// Build a pipeline from configuration, verifying both external tools are
  /// runnable. Tool paths are resolved relative to `project_root`; there is
  /// no degraded mode when a tool is missing.
  pub fn new(project_root: &Path, config: &PipelineConfig) -> PipelineResult<Self> {
    let java = resolve(project_root, &config.java_path);
    let mut js_tool =
      ClosureCompiler::new(&java, resolve(project_root, &config.closure_jar));
    let mut css_tool = YuiCompressor::new(&java, resolve(project_root, &config.yui_jar));
    if let Some(formatting) = config.output_formatting {
      js_tool = js_tool.with_formatting(formatting);
    }
    if let Some(seconds) = config.tool_timeout_secs {
      let timeout = Duration::from_secs(seconds);
      js_tool = js_tool.with_timeout(timeout);
      css_tool = css_tool.with_timeout(timeout);
    }
    js_tool.ensure_available()?;
    css_tool.ensure_available()?;

    Ok(
      Self::with_tools(
        config.layout(project_root),
        Box::new(js_tool),
        Box::new(css_tool),
      )
      .optimization_level(config.optimization_level)
      .failure_policy(config.failure_policy)
      .exclude_files(config.exclude_files.iter().cloned())
      .skip_combined_urls(config.skip_combined_urls)
      .cdn_hosts(config.cdn_hosts.clone()),
    )
  }

  /// Build a pipeline around explicit tool implementations. No availability
  /// check is performed; the caller owns that decision.
  pub fn with_tools(
    layout: PipelineLayout,
    js_tool: Box<dyn MinifierTool>,
    css_tool: Box<dyn MinifierTool>,
  ) -> Self {
    Self {
      layout,
      js_tool,
      css_tool,
      level: OptimizationLevel::default(),
      exclude: BTreeSet::new(),
      skip_combined_urls: true,
      policy: FailurePolicy::default(),
      hosts: HostRotation::default(),
    }
  }

  /// Set the optimization level forwarded to the JavaScript compiler.
  pub fn optimization_level(mut self, level: OptimizationLevel) -> Self {
    self.level = level;
    self
  }

  /// Set how package failures are handled during a pass.
  pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
    self.policy = policy;
    self
  }

  /// URLs that must never be combined.
  pub fn exclude_files(mut self, urls: impl IntoIterator<Item = String>) -> Self {
    self.exclude = urls.into_iter().collect();
    self
  }

  /// Whether URLs already under the assets prefix are left alone.
  pub fn skip_combined_urls(mut self, skip: bool) -> Self {
    self.skip_combined_urls = skip;
    self
  }

  /// CDN hosts rotated across artifact URLs.
  pub fn cdn_hosts(mut self, hosts: Vec<String>) -> Self {
    self.hosts = HostRotation::new(hosts);
    self
  }

  /// Run one render pass: combine every declared package in order, then
  /// rewrite `references` through the collected mapping.
  ///
  /// Mappings are recorded only after a package combines successfully, so a
  /// failed package degrades to its original, untouched references instead
  /// of a mapping that points at an artifact that was never written. Under
  /// [`FailurePolicy::BestEffort`] a failure is logged and recorded in the
  /// report while the remaining packages continue; under
  /// [`FailurePolicy::FailFast`] the first failure aborts the pass.
  pub fn run(&mut self, packages: &[Package], references: &[String]) -> PipelineResult<PassReport> {
    let mut map = ReferenceMap::new();
    let mut artifacts = Vec::new();
    let mut warnings = Vec::new();
    let mut failures = Vec::new();

    for package in packages {
      match self.process_package(package, &map) {
        Ok(None) => {}
        Ok(Some(outcome)) => {
          for name in outcome.mapped {
            map.record(name, outcome.url.clone());
          }
          if let Some(output) = outcome.diagnostics {
            warnings.push(ToolDiagnostics {
              package: package.name.clone(),
              tool: outcome.tool,
              output,
            });
          }
          artifacts.push(outcome.artifact);
        }
        Err(error) => match self.policy {
          FailurePolicy::FailFast => return Err(error),
          FailurePolicy::BestEffort => {
            warn!("package '{}' failed to combine: {error}", package.name);
            failures.push(PackageFailure {
              package: package.name.clone(),
              error,
            });
          }
        },
      }
    }

    Ok(PassReport {
      references: map.apply(references),
      map,
      artifacts,
      warnings,
      failures,
    })
  }

  /// Process one package against the mapping built so far. Returns `None`
  /// when the package is skipped: nothing on disk to fingerprint, all files
  /// excluded, or every file already claimed by an earlier package.
  fn process_package(
    &mut self,
    package: &Package,
    map: &ReferenceMap,
  ) -> PipelineResult<Option<PackageOutcome>> {
    let base_url = package.base_url.as_deref().unwrap_or(&self.layout.base_url);
    let mut sources = Vec::new();
    for url in &package.files {
      if self.exclude.contains(url) {
        continue;
      }
      if self.skip_combined_urls && url.starts_with(&self.layout.assets_url) {
        continue;
      }
      sources.push(SourceFile {
        path: self.local_path(url, base_url),
        url: url.clone(),
      });
    }
    if sources.is_empty() {
      debug!("package '{}': no files to combine", package.name);
      return Ok(None);
    }

    let Some(fingerprint) = package_fingerprint(&sources)? else {
      debug!(
        "package '{}': no files exist on disk, skipping",
        package.name
      );
      return Ok(None);
    };
    let out_file = artifact_file_name(&package.name, &fingerprint, package.kind);

    let candidates: Vec<SourceFile> = sources
      .iter()
      .filter(|source| source.path.is_file() && !map.contains(basename(&source.url)))
      .cloned()
      .collect();
    if candidates.is_empty() {
      debug!(
        "package '{}': all files already mapped by earlier packages",
        package.name
      );
      return Ok(None);
    }

    let tool = match package.kind {
      AssetKind::Js => self.js_tool.as_ref(),
      AssetKind::Css => self.css_tool.as_ref(),
    };
    let combiner = Combiner::new(
      &self.layout.assets_dir,
      &self.layout.scratch_dir,
      &self.layout.base_url,
      self.level,
    );
    let status = combiner.combine(
      tool,
      &package.name,
      package.kind,
      &candidates,
      &package.globals,
      &out_file,
    )?;
    let tool_name = tool.name().to_string();

    let (reused, diagnostics) = match status {
      CombineStatus::Reused => (true, None),
      CombineStatus::Written { diagnostics } => (false, diagnostics),
    };

    let url = self.hosts.decorate(&format!(
      "{}/{out_file}",
      self.layout.assets_url.trim_end_matches('/')
    ));
    let mapped = sources
      .iter()
      .map(|source| basename(&source.url).to_string())
      .collect();

    Ok(Some(PackageOutcome {
      artifact: ArtifactRecord {
        package: package.name.clone(),
        file_name: out_file,
        reused,
      },
      tool: tool_name,
      diagnostics,
      mapped,
      url,
    }))
  }

  /// Resolve a public URL to a local path under the web root.
  fn local_path(&self, url: &str, base_url: &str) -> PathBuf {
    let trimmed = url.strip_prefix(base_url).unwrap_or(url);
    self.layout.base_path.join(trimmed.trim_start_matches('/'))
  }
}

/// Resolve a configured path against the project root, leaving absolute
/// paths untouched.
fn resolve(root: &Path, value: &str) -> PathBuf {
  let path = Path::new(value);
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    root.join(path)
  }
}
