//! Draft storage trait and backends.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Trait for draft storage backends.
///
/// A backend is a flat key-value string store. Writes replace the whole
/// slot; there is no merging, last writer wins.
pub trait DraftStore: Send + Sync {
  /// Read the payload stored under a key, if any.
  fn read(&self, key: &str) -> Result<Option<String>>;

  /// Store a payload under a key, replacing any previous one.
  fn write(&self, key: &str, payload: &str) -> Result<()>;

  /// Remove the payload stored under a key. Removing an absent key is
  /// a no-op.
  fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory storage backend.
///
/// Drafts live only as long as the process. Used in tests and for
/// embedders that want autosave semantics without durability.
#[derive(Default)]
pub struct MemoryDraftStore {
  slots: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl DraftStore for MemoryDraftStore {
  fn read(&self, key: &str) -> Result<Option<String>> {
    let slots = self
      .slots
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(slots.get(key).cloned())
  }

  fn write(&self, key: &str, payload: &str) -> Result<()> {
    let mut slots = self
      .slots
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    slots.insert(key.to_string(), payload.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let mut slots = self
      .slots
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    slots.remove(key);
    Ok(())
  }
}

/// SQLite-based draft storage.
pub struct SqliteDraftStore {
  conn: Mutex<Connection>,
}

impl SqliteDraftStore {
  /// Open or create the draft database at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  /// Open or create the draft database at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create draft directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open draft database at {}: {}", path.display(), e))?;

    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("edura").join("drafts.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(DRAFT_SCHEMA)
      .map_err(|e| eyre!("Failed to run draft migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for the draft table.
const DRAFT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS drafts (
    key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    saved_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl DraftStore for SqliteDraftStore {
  fn read(&self, key: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT payload FROM drafts WHERE key = ?")
      .map_err(|e| eyre!("Failed to prepare draft query: {}", e))?;

    let payload: Option<String> = stmt.query_row(params![key], |row| row.get(0)).ok();

    Ok(payload)
  }

  fn write(&self, key: &str, payload: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO drafts (key, payload, saved_at) VALUES (?, ?, datetime('now'))",
        params![key, payload],
      )
      .map_err(|e| eyre!("Failed to store draft: {}", e))?;

    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM drafts WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to remove draft: {}", e))?;

    Ok(())
  }
}
