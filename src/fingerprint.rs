//! Content-version fingerprinting for package source files.

use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};

use crate::error::PipelineResult;
use crate::models::SourceFile;

/// Width of the hex fingerprint embedded in artifact file names.
const FINGERPRINT_LEN: usize = 40;

/// Compute a stable fingerprint over a package's source files.
///
/// Each existing file contributes its public URL, its modification time in
/// seconds and its content to a SHA-256 digest, in declared order. Hashing
/// content catches edits that keep the timestamp (a restored backup with the
/// old mtime), hashing the timestamp catches a bare `touch`; either kind of
/// change rolls the fingerprint and thereby the artifact name.
///
/// Files that do not exist on disk are silently skipped, so optional assets
/// that are absent do not break the package. Returns `None` when no file
/// exists at all, in which case there is nothing to combine and the caller
/// must skip the package.
pub fn package_fingerprint(sources: &[SourceFile]) -> PipelineResult<Option<String>> {
  let mut hasher = Sha256::new();
  let mut seen = 0usize;

  for source in sources {
    if !source.path.is_file() {
      continue;
    }

    let metadata = std::fs::metadata(&source.path)?;
    let mtime = metadata
      .modified()?
      .duration_since(UNIX_EPOCH)
      .map(|elapsed| elapsed.as_secs())
      .unwrap_or(0);

    hasher.update(source.url.as_bytes());
    hasher.update(mtime.to_le_bytes());
    hasher.update(std::fs::read(&source.path)?);
    seen += 1;
  }

  if seen == 0 {
    return Ok(None);
  }

  let mut digest = format!("{:x}", hasher.finalize());
  digest.truncate(FINGERPRINT_LEN);
  Ok(Some(digest))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::path::Path;
  use std::time::{Duration, UNIX_EPOCH};
  use tempfile::tempdir;

  fn source(dir: &Path, name: &str) -> SourceFile {
    SourceFile {
      url: format!("/js/{name}"),
      path: dir.join(name),
    }
  }

  fn set_mtime(path: &Path, seconds: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file
      .set_modified(UNIX_EPOCH + Duration::from_secs(seconds))
      .unwrap();
  }

  #[test]
  fn identical_inputs_yield_identical_fingerprints() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.js"), "var a = 1;").unwrap();
    fs::write(dir.path().join("b.js"), "var b = 2;").unwrap();
    set_mtime(&dir.path().join("a.js"), 1000);
    set_mtime(&dir.path().join("b.js"), 1000);

    let sources = vec![source(dir.path(), "a.js"), source(dir.path(), "b.js")];
    let first = package_fingerprint(&sources).unwrap().unwrap();
    let second = package_fingerprint(&sources).unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), FINGERPRINT_LEN);
  }

  #[test]
  fn mtime_change_rolls_the_fingerprint() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.js"), "var a = 1;").unwrap();
    fs::write(dir.path().join("b.js"), "var b = 2;").unwrap();
    set_mtime(&dir.path().join("a.js"), 1000);
    set_mtime(&dir.path().join("b.js"), 1000);

    let sources = vec![source(dir.path(), "a.js"), source(dir.path(), "b.js")];
    let before = package_fingerprint(&sources).unwrap().unwrap();

    set_mtime(&dir.path().join("b.js"), 2000);
    let after = package_fingerprint(&sources).unwrap().unwrap();

    assert_ne!(before, after);
  }

  #[test]
  fn content_change_rolls_the_fingerprint_even_with_same_mtime() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.js"), "var a = 1;").unwrap();
    set_mtime(&dir.path().join("a.js"), 1000);

    let sources = vec![source(dir.path(), "a.js")];
    let before = package_fingerprint(&sources).unwrap().unwrap();

    fs::write(dir.path().join("a.js"), "var a = 2;").unwrap();
    set_mtime(&dir.path().join("a.js"), 1000);
    let after = package_fingerprint(&sources).unwrap().unwrap();

    assert_ne!(before, after);
  }

  #[test]
  fn missing_files_are_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.js"), "var a = 1;").unwrap();
    set_mtime(&dir.path().join("a.js"), 1000);

    let with_missing = vec![
      source(dir.path(), "a.js"),
      source(dir.path(), "absent.js"),
    ];
    let without_missing = vec![source(dir.path(), "a.js")];

    assert_eq!(
      package_fingerprint(&with_missing).unwrap(),
      package_fingerprint(&without_missing).unwrap()
    );
  }

  #[test]
  fn no_existing_files_yields_no_fingerprint() {
    let dir = tempdir().unwrap();
    let sources = vec![source(dir.path(), "absent.js")];
    assert_eq!(package_fingerprint(&sources).unwrap(), None);
  }
}
