//! Command line driver running one combination pass from a config file.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use web_asset_bundler::{AssetPipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "web_asset_bundler", version, about)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Combine and minify all configured packages once.
  Bundle {
    /// Project root containing the web root and config file.
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Explicit config file instead of discovering `bundler.config.json`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON file holding the page's reference list (an array of URLs).
    /// Defaults to the URLs declared by the configured packages.
    #[arg(long)]
    references: Option<PathBuf>,
    /// Write the rewritten reference list to this JSON file.
    #[arg(long)]
    out: Option<PathBuf>,
  },
  /// Verify the external minifier tools are installed and runnable.
  Check {
    /// Project root containing the web root and config file.
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Explicit config file instead of discovering `bundler.config.json`.
    #[arg(long)]
    config: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  match Cli::parse().command {
    Command::Bundle {
      root,
      config,
      references,
      out,
    } => bundle(&root, config, references, out),
    Command::Check { root, config } => check(&root, config),
  }
}

fn load_config(root: &std::path::Path, explicit: Option<PathBuf>) -> Result<PipelineConfig> {
  match explicit {
    Some(path) => PipelineConfig::from_path(&path)
      .with_context(|| format!("failed to read config from {}", path.display())),
    None => Ok(PipelineConfig::discover(root)),
  }
}

fn bundle(
  root: &std::path::Path,
  config: Option<PathBuf>,
  references: Option<PathBuf>,
  out: Option<PathBuf>,
) -> Result<()> {
  let config = load_config(root, config)?;
  if config.packages.is_empty() {
    bail!("no packages configured, nothing to bundle");
  }

  let references = match references {
    Some(path) => {
      let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read references from {}", path.display()))?;
      serde_json::from_str::<Vec<String>>(&content)
        .with_context(|| format!("failed to parse references in {}", path.display()))?
    }
    None => config
      .packages
      .iter()
      .flat_map(|package| package.files.iter().cloned())
      .collect(),
  };

  let mut pipeline = AssetPipeline::new(root, &config)?;
  let pass = pipeline.run(&config.packages, &references)?;

  for artifact in &pass.artifacts {
    let action = if artifact.reused { "reused" } else { "wrote" };
    println!(
      "{action} {}/{} ({})",
      config.assets_url.trim_end_matches('/'),
      artifact.file_name,
      artifact.package
    );
  }
  for warning in &pass.warnings {
    eprintln!(
      "warning: {} ({}): {}",
      warning.package, warning.tool, warning.output
    );
  }
  for failure in &pass.failures {
    eprintln!("error: package '{}': {}", failure.package, failure.error);
  }

  match out {
    Some(path) => {
      let json = serde_json::to_string_pretty(&pass.references)?;
      std::fs::write(&path, json)
        .with_context(|| format!("failed to write references to {}", path.display()))?;
    }
    None => {
      for reference in &pass.references {
        println!("{reference}");
      }
    }
  }

  if !pass.failures.is_empty() {
    bail!("{} package(s) failed to combine", pass.failures.len());
  }
  Ok(())
}

fn check(root: &std::path::Path, config: Option<PathBuf>) -> Result<()> {
  let config = load_config(root, config)?;
  AssetPipeline::new(root, &config)?;
  println!("external tools are available");
  Ok(())
}
