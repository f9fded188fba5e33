//! Round-robin assignment of CDN hosts to artifact URLs.

/// Stateful round-robin allocator over a configured CDN host list.
///
/// Owned by the pipeline and threaded through each render pass explicitly,
/// with a plain index counter advanced modulo the host count.
#[derive(Debug, Clone, Default)]
pub struct HostRotation {
  hosts: Vec<String>,
  next: usize,
}

impl HostRotation {
  /// Create an allocator over the given host list. Hosts are used verbatim
  /// as URL prefixes, e.g. `https://cdn1.example.com`.
  pub fn new(hosts: Vec<String>) -> Self {
    Self { hosts, next: 0 }
  }

  /// Whether any hosts are configured.
  pub fn is_empty(&self) -> bool {
    self.hosts.is_empty()
  }

  /// Hand out the next host in rotation, or `None` when no hosts are
  /// configured.
  pub fn assign(&mut self) -> Option<&str> {
    if self.hosts.is_empty() {
      return None;
    }
    let host = &self.hosts[self.next % self.hosts.len()];
    self.next = (self.next + 1) % self.hosts.len();
    Some(host)
  }

  /// Prefix a root-relative URL with the next host in rotation. URLs pass
  /// through unchanged when no hosts are configured.
  pub fn decorate(&mut self, url: &str) -> String {
    match self.assign() {
      Some(host) => format!("{}{}", host.trim_end_matches('/'), url),
      None => url.to_string(),
    }
  }
}
