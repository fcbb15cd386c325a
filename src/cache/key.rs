//! Cache key types for fetchable resources.

use sha2::{Digest, Sha256};

/// Trait for types that identify a cached resource.
///
/// Implementors provide a stable hash used as the cache slot and a
/// human-readable description for logging. Keys must be non-empty: an
/// empty key would alias every caller that forgot to set one onto the
/// same slot.
pub trait FetchKey {
  /// Stable, fixed-length identifier for the cache slot.
  fn cache_hash(&self) -> String;

  /// Human-readable description for logging.
  fn description(&self) -> String;
}

/// A resource name plus the parameters the read depends on.
///
/// Two keys with the same name but different dependencies hash to different
/// slots, so a changed dependency always triggers a fresh fetch.
#[derive(Clone, Debug)]
pub struct ResourceKey {
  name: String,
  deps: Vec<String>,
}

impl ResourceKey {
  /// Create a key for a named resource with no dependencies.
  ///
  /// The name must be non-empty.
  pub fn new(name: impl Into<String>) -> Self {
    let name = name.into();
    debug_assert!(!name.is_empty(), "resource key name must be non-empty");
    Self {
      name,
      deps: Vec::new(),
    }
  }

  /// Append a dependency value. Order matters.
  pub fn with_dep(mut self, dep: impl ToString) -> Self {
    self.deps.push(dep.to_string());
    self
  }
}

impl FetchKey for ResourceKey {
  fn cache_hash(&self) -> String {
    let mut input = self.name.clone();
    for dep in &self.deps {
      input.push('\x1f');
      input.push_str(dep);
    }

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    if self.deps.is_empty() {
      self.name.clone()
    } else {
      format!("{} [{}]", self.name, self.deps.join(", "))
    }
  }
}

/// Plain strings are usable as keys when the caller has already composed
/// one. The string must be non-empty.
impl FetchKey for &str {
  fn cache_hash(&self) -> String {
    debug_assert!(!self.is_empty(), "fetch key must be non-empty");
    let mut hasher = Sha256::new();
    hasher.update(self.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    (*self).to_string()
  }
}
