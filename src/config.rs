use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Tuning knobs for the client-core utilities.
///
/// Everything here has a sensible default; a config file is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub drafts: DraftConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before a cached read is considered expired
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: default_ttl_secs(),
    }
  }
}

fn default_ttl_secs() -> u64 {
  300
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftConfig {
  /// Milliseconds of quiet time before a changed draft is persisted
  #[serde(default = "default_debounce_ms")]
  pub debounce_ms: u64,
  /// Override for the draft database location
  pub path: Option<PathBuf>,
}

impl Default for DraftConfig {
  fn default() -> Self {
    Self {
      debounce_ms: default_debounce_ms(),
      path: None,
    }
  }
}

fn default_debounce_ms() -> u64 {
  2000
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./edura.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/edura/config.yaml
  ///
  /// Falls back to defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("edura.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("edura").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Cache TTL in the form `CacheService::with_ttl` takes.
  pub fn cache_ttl(&self) -> chrono::Duration {
    chrono::Duration::seconds(self.cache.ttl_secs as i64)
  }

  /// Draft debounce delay in the form `DraftSaver::new` takes.
  pub fn draft_delay(&self) -> std::time::Duration {
    std::time::Duration::from_millis(self.drafts.debounce_ms)
  }
}
