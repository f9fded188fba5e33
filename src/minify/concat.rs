//! Concatenation of package sources into a single scratch file.
//!
//! The external tools take one input file, so sources are joined first. The
//! combined artifact is served from the assets directory rather than the
//! directory the sources were authored in, which is why relative references
//! inside stylesheets are adjusted during the join.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::OnceLock;

use regex::Regex;
use tempfile::NamedTempFile;

use crate::error::PipelineResult;
use crate::models::{AssetKind, SourceFile};

/// Matches `url(` references pointing at the web root, e.g. `url("/img/x.png")`.
fn root_url_reference() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"url\(\s*(['"]?)/"#).expect("invalid root url regex")
  })
}

/// Join a package's existing sources into one temp file under `scratch_dir`.
///
/// For JavaScript packages any configured globals are emitted first as `var`
/// declarations. For stylesheets, relative `../` references are stepped one
/// directory further out (the artifact lives one level deeper than the
/// authored files) and root-absolute `url(/...)` references are prefixed with
/// the site base URL.
pub fn join_sources(
  kind: AssetKind,
  sources: &[SourceFile],
  globals: &BTreeMap<String, serde_json::Value>,
  base_url: &str,
  scratch_dir: &std::path::Path,
) -> PipelineResult<NamedTempFile> {
  let mut joined = tempfile::Builder::new()
    .prefix("combine-")
    .suffix(&format!(".{}", kind.extension()))
    .tempfile_in(scratch_dir)?;

  if kind == AssetKind::Js {
    for (name, value) in globals {
      writeln!(joined, "var {name} = {};", serde_json::to_string(value)?)?;
    }
  }

  for source in sources {
    let content = std::fs::read_to_string(&source.path)?;
    let content = match kind {
      AssetKind::Js => content,
      AssetKind::Css => rewrite_stylesheet(&content, &source.url, base_url),
    };
    joined.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
      joined.write_all(b"\n")?;
    }
  }

  joined.flush()?;
  Ok(joined)
}

/// Adjust relative and root-absolute references in one stylesheet.
fn rewrite_stylesheet(content: &str, source_url: &str, base_url: &str) -> String {
  let stepped = content.replace("../", &format!("../../{}", theme_prefix(source_url, base_url)));
  if base_url.is_empty() {
    return stepped;
  }
  root_url_reference()
    .replace_all(&stepped, |caps: &regex::Captures<'_>| {
      format!("url({}{}/", &caps[1], base_url)
    })
    .into_owned()
}

/// Theme directory fragment for sources served out of `themes/<name>/`,
/// preserved when their relative references are stepped outward.
fn theme_prefix(source_url: &str, base_url: &str) -> String {
  let path = source_url.strip_prefix(base_url).unwrap_or(source_url);
  let mut segments = path.trim_start_matches('/').split('/');
  match (segments.next(), segments.next(), segments.next()) {
    (Some("themes"), Some(theme), Some(_)) => format!("themes/{theme}/"),
    _ => String::new(),
  }
}
