//! Pipeline configuration loader describing tools, layout and packages.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::models::{
    FailurePolicy, OptimizationLevel, OutputFormatting, Package, PipelineLayout,
};

const DEFAULT_CONFIG_FILE: &str = "bundler.config.json";

/// Discoverable pipeline configuration read from a JSON file in the project
/// root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path to the java runtime used to launch both minifier jars.
    pub java_path: String,
    /// Path to the Closure Compiler jar, relative to the project root.
    pub closure_jar: String,
    /// Path to the YUI Compressor jar, relative to the project root.
    pub yui_jar: String,
    /// Optimization level forwarded to the JavaScript compiler.
    pub optimization_level: OptimizationLevel,
    /// Optional output formatting forwarded to the JavaScript compiler.
    pub output_formatting: Option<OutputFormatting>,
    /// Public URL prefix the site is served under.
    pub base_url: String,
    /// Local web root that public URLs resolve against.
    pub web_root: String,
    /// Directory combined artifacts are written to.
    pub assets_dir: String,
    /// Public URL prefix of the assets directory.
    pub assets_url: String,
    /// Scratch directory for concatenation temp files. Must share a
    /// filesystem with the assets directory so artifacts can be renamed into
    /// place.
    pub scratch_dir: String,
    /// Public URLs that must never be combined.
    pub exclude_files: Vec<String>,
    /// Leave URLs already under the assets prefix alone.
    pub skip_combined_urls: bool,
    /// CDN hosts rotated across artifact URLs. Empty disables rotation.
    pub cdn_hosts: Vec<String>,
    /// Kill an external tool after this many seconds. `None` waits forever.
    pub tool_timeout_secs: Option<u64>,
    /// How package failures are handled during a render pass.
    pub failure_policy: FailurePolicy,
    /// Declared asset packages, processed in order.
    pub packages: Vec<Package>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            java_path: "/usr/bin/java".into(),
            closure_jar: "tools/compiler.jar".into(),
            yui_jar: "tools/yuicompressor-2.4.2.jar".into(),
            optimization_level: OptimizationLevel::default(),
            output_formatting: None,
            base_url: String::new(),
            web_root: "public".into(),
            assets_dir: "public/assets".into(),
            assets_url: "/assets".into(),
            scratch_dir: "runtime".into(),
            exclude_files: Vec::new(),
            skip_combined_urls: true,
            cdn_hosts: Vec::new(),
            tool_timeout_secs: None,
            failure_policy: FailurePolicy::default(),
            packages: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Attempt to load configuration from the provided project root.
    ///
    /// When the configuration file does not exist or fails to parse we fall
    /// back to default values so downstream callers can continue operating
    /// with sensible assumptions.
    pub fn discover(project_root: &Path) -> Self {
        let candidate = project_root.join(DEFAULT_CONFIG_FILE);
        Self::from_path(&candidate).unwrap_or_default()
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Resolve the configured directories against the project root.
    pub fn layout(&self, project_root: &Path) -> PipelineLayout {
        PipelineLayout {
            base_path: project_root.join(&self.web_root),
            base_url: self.base_url.clone(),
            assets_dir: project_root.join(&self.assets_dir),
            assets_url: self.assets_url.clone(),
            scratch_dir: project_root.join(&self.scratch_dir),
        }
    }
}
