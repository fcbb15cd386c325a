//! Debounced draft saver.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

use super::storage::DraftStore;

/// Payload written to the store: the draft value plus when it was saved.
#[derive(Serialize, Deserialize)]
struct DraftEnvelope<T> {
  data: T,
  saved_at: DateTime<Utc>,
}

/// A previously persisted draft offered back for restoration.
#[derive(Debug, Clone)]
pub struct DraftSnapshot<T> {
  pub data: T,
  pub saved_at: DateTime<Utc>,
}

/// Debounced autosave for a single draft slot.
///
/// Each call site owns one saver. `update` restarts the quiet-period
/// timer; only when the timer runs out is the latest value written, so a
/// burst of keystrokes produces a single write. Dropping the saver while
/// the timer is pending cancels the write entirely - there is no flush
/// on teardown.
///
/// The key and delay are fixed for the life of the saver: moving to a
/// different slot or quiet period means constructing a new saver, and
/// dropping the old one cancels whatever it had pending.
pub struct DraftSaver<T> {
  store: Arc<dyn DraftStore>,
  key: String,
  delay: Duration,
  pending: Option<JoinHandle<()>>,
  saved: Option<DraftSnapshot<T>>,
}

impl<T: Serialize + DeserializeOwned> DraftSaver<T> {
  /// Create a saver for a draft slot, reading any existing snapshot.
  ///
  /// A snapshot that cannot be read or parsed is discarded with a
  /// warning rather than surfaced as an error.
  pub fn new(store: Arc<dyn DraftStore>, key: impl Into<String>, delay: Duration) -> Self {
    let key = key.into();
    let saved = match store.read(&key) {
      Ok(Some(payload)) => match serde_json::from_str::<DraftEnvelope<T>>(&payload) {
        Ok(envelope) => Some(DraftSnapshot {
          data: envelope.data,
          saved_at: envelope.saved_at,
        }),
        Err(e) => {
          warn!(key = %key, "Discarding unreadable draft: {}", e);
          None
        }
      },
      Ok(None) => None,
      Err(e) => {
        warn!(key = %key, "Failed to read draft: {}", e);
        None
      }
    };

    Self {
      store,
      key,
      delay,
      pending: None,
      saved,
    }
  }

  /// The last snapshot found in storage when this saver was created.
  pub fn saved(&self) -> Option<&DraftSnapshot<T>> {
    self.saved.as_ref()
  }

  /// Record a new value, restarting the debounce timer.
  ///
  /// The value is serialized immediately; the write happens only if no
  /// further update arrives before the quiet period elapses. `saved_at`
  /// is stamped when the write fires. Write failures are logged and
  /// dropped - the next cycle retries with the newest value.
  pub fn update(&mut self, value: &T) {
    let data = match serde_json::to_value(value) {
      Ok(data) => data,
      Err(e) => {
        warn!(key = %self.key, "Failed to serialize draft: {}", e);
        return;
      }
    };

    if let Some(pending) = self.pending.take() {
      pending.abort();
    }

    let store = Arc::clone(&self.store);
    let key = self.key.clone();
    let delay = self.delay;
    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;

      let envelope = DraftEnvelope {
        data,
        saved_at: Utc::now(),
      };
      match serde_json::to_string(&envelope) {
        Ok(payload) => {
          if let Err(e) = store.write(&key, &payload) {
            warn!(key = %key, "Failed to persist draft: {}", e);
          }
        }
        Err(e) => warn!(key = %key, "Failed to serialize draft envelope: {}", e),
      }
    }));
  }

  /// Remove the stored snapshot, typically after a successful submit.
  ///
  /// Safe to call when no snapshot exists, and safe to call repeatedly.
  pub fn clear_saved(&mut self) {
    if let Err(e) = self.store.remove(&self.key) {
      warn!(key = %self.key, "Failed to clear draft: {}", e);
    }
    self.saved = None;
  }
}

impl<T> Drop for DraftSaver<T> {
  fn drop(&mut self) {
    // Teardown inside the quiet window cancels the pending write
    if let Some(pending) = self.pending.take() {
      pending.abort();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::drafts::MemoryDraftStore;
  use color_eyre::Result;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Store wrapper that counts writes.
  struct CountingStore {
    inner: MemoryDraftStore,
    writes: AtomicUsize,
  }

  impl CountingStore {
    fn new() -> Self {
      Self {
        inner: MemoryDraftStore::new(),
        writes: AtomicUsize::new(0),
      }
    }

    fn write_count(&self) -> usize {
      self.writes.load(Ordering::SeqCst)
    }
  }

  impl DraftStore for CountingStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
      self.inner.read(key)
    }

    fn write(&self, key: &str, payload: &str) -> Result<()> {
      self.writes.fetch_add(1, Ordering::SeqCst);
      self.inner.write(key, payload)
    }

    fn remove(&self, key: &str) -> Result<()> {
      self.inner.remove(key)
    }
  }

  /// Install a subscriber so `RUST_LOG=warn cargo test` shows swallowed
  /// storage failures.
  fn init_tracing() {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
      .with_test_writer()
      .try_init();
  }

  fn short_delay() -> Duration {
    Duration::from_millis(80)
  }

  async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
  }

  #[tokio::test]
  async fn test_rapid_updates_coalesce_into_one_write() {
    let store = Arc::new(CountingStore::new());
    let mut saver: DraftSaver<String> =
      DraftSaver::new(store.clone(), "story-form", short_delay());

    for i in 1..=5 {
      saver.update(&format!("draft v{}", i));
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    settle().await;

    assert_eq!(store.write_count(), 1);
    let payload = store.read("story-form").unwrap().unwrap();
    assert!(payload.contains("draft v5"));
  }

  #[tokio::test]
  async fn test_saved_snapshot_restores_last_value() {
    let store: Arc<dyn DraftStore> = Arc::new(MemoryDraftStore::new());

    let mut saver: DraftSaver<String> =
      DraftSaver::new(store.clone(), "artwork-form", short_delay());
    assert!(saver.saved().is_none());

    saver.update(&"my robot painting".to_string());
    settle().await;

    let restored: DraftSaver<String> = DraftSaver::new(store, "artwork-form", short_delay());
    let snapshot = restored.saved().unwrap();
    assert_eq!(snapshot.data, "my robot painting");
    assert!(snapshot.saved_at <= Utc::now());
  }

  #[tokio::test]
  async fn test_distinct_keys_are_isolated() {
    let store = Arc::new(MemoryDraftStore::new());
    let mut saver_a: DraftSaver<String> =
      DraftSaver::new(store.clone(), "essay", short_delay());

    saver_a.update(&"hello".to_string());
    settle().await;

    assert!(store.read("essay").unwrap().is_some());
    assert!(store.read("video").unwrap().is_none());
  }

  #[tokio::test]
  async fn test_drop_inside_quiet_window_cancels_write() {
    let store = Arc::new(CountingStore::new());

    {
      let mut saver: DraftSaver<String> =
        DraftSaver::new(store.clone(), "abandoned", short_delay());
      saver.update(&"never persisted".to_string());
    }
    settle().await;

    assert_eq!(store.write_count(), 0);
    assert!(store.read("abandoned").unwrap().is_none());
  }

  #[tokio::test]
  async fn test_clear_saved_is_idempotent() {
    let store = Arc::new(MemoryDraftStore::new());
    let mut saver: DraftSaver<String> =
      DraftSaver::new(store.clone(), "signup-form", short_delay());

    // Clearing with no entry is a no-op
    saver.clear_saved();
    assert!(store.read("signup-form").unwrap().is_none());

    saver.update(&"half-filled".to_string());
    settle().await;
    assert!(store.read("signup-form").unwrap().is_some());

    saver.clear_saved();
    saver.clear_saved();
    assert!(store.read("signup-form").unwrap().is_none());
    assert!(saver.saved().is_none());
  }

  #[tokio::test]
  async fn test_unreadable_snapshot_degrades_to_none() {
    init_tracing();
    let store: Arc<dyn DraftStore> = Arc::new(MemoryDraftStore::new());
    store.write("corrupt", "not json at all").unwrap();

    let saver: DraftSaver<String> = DraftSaver::new(store, "corrupt", short_delay());
    assert!(saver.saved().is_none());
  }

  #[tokio::test]
  async fn test_structured_values_round_trip() {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct EntryForm {
      title: String,
      category: String,
      description: String,
    }

    let store: Arc<dyn DraftStore> = Arc::new(MemoryDraftStore::new());
    let form = EntryForm {
      title: "Space Adventure".to_string(),
      category: "writing".to_string(),
      description: "A story about a trip to Mars".to_string(),
    };

    let mut saver: DraftSaver<EntryForm> =
      DraftSaver::new(store.clone(), "entry-form", short_delay());
    saver.update(&form);
    settle().await;

    let restored: DraftSaver<EntryForm> = DraftSaver::new(store, "entry-form", short_delay());
    assert_eq!(restored.saved().unwrap().data, form);
  }
}
