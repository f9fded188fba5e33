//! On-disk artifact cache keyed by fingerprinted file names.
//!
//! Presence of the artifact file is the entire cache: the fingerprint is part
//! of the file name, so existence implies validity. There is no sidecar
//! metadata and no invalidation logic; artifacts for old fingerprints simply
//! accumulate until external housekeeping removes them.

use std::path::{Path, PathBuf};

use crate::models::AssetKind;

/// File name of the combined artifact for a package and fingerprint.
pub fn artifact_file_name(package: &str, fingerprint: &str, kind: AssetKind) -> String {
  format!("{package}_{fingerprint}.{}", kind.extension())
}

/// Full path of an artifact under the assets directory.
pub fn artifact_path(assets_dir: &Path, file_name: &str) -> PathBuf {
  assets_dir.join(file_name)
}

/// Whether the combined artifact already exists and combination can be
/// skipped.
pub fn artifact_exists(assets_dir: &Path, file_name: &str) -> bool {
  artifact_path(assets_dir, file_name).is_file()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  #[test]
  fn artifact_names_encode_package_fingerprint_and_kind() {
    assert_eq!(
      artifact_file_name("app", "deadbeef", AssetKind::Js),
      "app_deadbeef.js"
    );
    assert_eq!(
      artifact_file_name("site", "cafe", AssetKind::Css),
      "site_cafe.css"
    );
  }

  #[test]
  fn existence_check_is_a_plain_file_probe() {
    let dir = tempdir().unwrap();
    assert!(!artifact_exists(dir.path(), "app_deadbeef.js"));

    fs::write(dir.path().join("app_deadbeef.js"), "var a;").unwrap();
    assert!(artifact_exists(dir.path(), "app_deadbeef.js"));

    // A directory with the artifact name is not a cache hit.
    fs::create_dir(dir.path().join("app_cafe.js")).unwrap();
    assert!(!artifact_exists(dir.path(), "app_cafe.js"));
  }
}
