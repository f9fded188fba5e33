//! Basename to artifact URL substitution applied to a page's references.

use std::collections::BTreeMap;

/// Mapping from original file basenames to combined artifact URLs.
///
/// Built incrementally across packages within one render pass and applied
/// exactly once at the end. Recording is idempotent-by-first-write: the first
/// package to claim a basename wins and later entries for the same basename
/// are ignored, so overlapping packages cannot clobber each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMap {
  entries: BTreeMap<String, String>,
}

impl ReferenceMap {
  /// Create an empty map.
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a basename to URL mapping. Returns `false` when the basename was
  /// already claimed and the call was ignored.
  pub fn record(&mut self, basename: impl Into<String>, url: impl Into<String>) -> bool {
    let basename = basename.into();
    if self.entries.contains_key(&basename) {
      return false;
    }
    self.entries.insert(basename, url.into());
    true
  }

  /// Whether a basename has already been claimed this pass.
  pub fn contains(&self, basename: &str) -> bool {
    self.entries.contains_key(basename)
  }

  /// Look up the mapped URL for a basename.
  pub fn get(&self, basename: &str) -> Option<&str> {
    self.entries.get(basename).map(String::as_str)
  }

  /// Number of recorded mappings.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Whether the map holds no mappings.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Rewrite every reference whose basename has an entry, replacing it with
  /// the mapped URL. References without an entry pass through unchanged.
  pub fn apply(&self, references: &[String]) -> Vec<String> {
    references
      .iter()
      .map(|reference| match self.get(basename(reference)) {
        Some(url) => url.to_string(),
        None => reference.clone(),
      })
      .collect()
  }

  /// Iterate over recorded mappings in basename order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .entries
      .iter()
      .map(|(basename, url)| (basename.as_str(), url.as_str()))
  }
}

/// Extract the basename of a URL or path, ignoring any query string.
pub fn basename(url: &str) -> &str {
  let without_query = url.split(['?', '#']).next().unwrap_or(url);
  without_query
    .rsplit('/')
    .next()
    .unwrap_or(without_query)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn first_writer_wins() {
    let mut map = ReferenceMap::new();
    assert!(map.record("site.js", "/assets/app_f1.js"));
    assert!(!map.record("site.js", "/assets/admin_f2.js"));
    assert_eq!(map.get("site.js"), Some("/assets/app_f1.js"));
    assert_eq!(map.len(), 1);
  }

  #[test]
  fn apply_rewrites_mapped_references_only() {
    let mut map = ReferenceMap::new();
    map.record("a.js", "/assets/app_f1.js");

    let references = vec![
      "/js/a.js".to_string(),
      "/js/vendor.js".to_string(),
    ];
    let rewritten = map.apply(&references);

    assert_eq!(rewritten, vec![
      "/assets/app_f1.js".to_string(),
      "/js/vendor.js".to_string(),
    ]);
  }

  #[test]
  fn apply_on_empty_map_passes_everything_through() {
    let map = ReferenceMap::new();
    let references = vec!["/css/site.css".to_string()];
    assert_eq!(map.apply(&references), references);
  }

  #[test]
  fn basename_strips_directories_and_query_strings() {
    assert_eq!(basename("/js/vendor/jquery.js"), "jquery.js");
    assert_eq!(basename("/css/site.css?v=3"), "site.css");
    assert_eq!(basename("site.css"), "site.css");
    assert_eq!(basename("/js/app.js#main"), "app.js");
  }
}
