//! Cache service that orchestrates TTL lookups with producer invocation.

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::key::FetchKey;

/// A single cached value, stored as serialized JSON so one map can hold
/// results of any shape.
struct CacheEntry {
  data: serde_json::Value,
  fetched_at: DateTime<Utc>,
}

/// Shared cache for asynchronous reads.
///
/// One service instance is constructed at startup and handed to every
/// consumer, so all call sites using the same key see the same entry.
/// Entries live for the lifetime of the service; an expired entry is
/// treated as absent and overwritten by the next successful fetch.
pub struct CacheService {
  entries: Mutex<HashMap<String, CacheEntry>>,
  /// Per-key fetch locks. Holding a key's lock across the whole
  /// check-then-fetch sequence means concurrent callers for the same key
  /// share one producer call instead of racing.
  locks: tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
  /// How long before a cached value is considered expired
  ttl: Duration,
}

impl CacheService {
  /// Create a cache service with the default 5 minute TTL.
  pub fn new() -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      locks: tokio::sync::Mutex::new(HashMap::new()),
      ttl: Duration::minutes(5),
    }
  }

  /// Set the default TTL for cached values.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Fetch a value with cache-first strategy and the service default TTL.
  ///
  /// 1. Check the cache - if a non-expired entry exists, return it without
  ///    invoking the producer
  /// 2. If absent or expired, invoke the producer and store the result
  /// 3. On producer failure, return the previous entry if one exists
  ///    (stale-on-error), leaving it untouched in the cache
  pub async fn fetch<K, T, F, Fut>(&self, key: &K, producer: F) -> Result<FetchOutcome<T>>
  where
    K: FetchKey,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    self.fetch_with_ttl(key, self.ttl, producer).await
  }

  /// Fetch with an explicit TTL for this call.
  ///
  /// Expiry is per entry: each entry carries its own `fetched_at` and is
  /// compared against the TTL of the call observing it.
  pub async fn fetch_with_ttl<K, T, F, Fut>(
    &self,
    key: &K,
    ttl: Duration,
    producer: F,
  ) -> Result<FetchOutcome<T>>
  where
    K: FetchKey,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let slot = key.cache_hash();

    // Serialize fetches per key. A caller arriving while another fetch for
    // this key is in flight parks here, then sees the fresh entry below.
    let lock = self.key_lock(&slot).await;
    let _held = lock.lock().await;

    if let Some((data, fetched_at)) = self.lookup(&slot)? {
      if Utc::now() - fetched_at < ttl {
        debug!(key = %key.description(), "cache fresh, skipping producer");
        let value = decode(data, key)?;
        return Ok(FetchOutcome::from_cache(value, fetched_at));
      }
    }

    debug!(key = %key.description(), "cache miss or expired, invoking producer");
    match producer().await {
      Ok(value) => {
        self.store(&slot, &value, key)?;
        Ok(FetchOutcome::from_producer(value))
      }
      Err(err) => {
        // Producer failed: serve the previous value if we have one, and
        // leave the entry exactly as it was.
        if let Some((data, fetched_at)) = self.lookup(&slot)? {
          debug!(key = %key.description(), "producer failed, serving stale value");
          let value = decode(data, key)?;
          Ok(FetchOutcome::stale(value, fetched_at, &err))
        } else {
          Err(err)
        }
      }
    }
  }

  /// Read the current entry for a key without fetching, regardless of
  /// freshness. Lets a caller render the last settled value while a fetch
  /// for the same key is still pending.
  pub fn peek<K, T>(&self, key: &K) -> Result<Option<FetchOutcome<T>>>
  where
    K: FetchKey,
    T: DeserializeOwned,
  {
    match self.lookup(&key.cache_hash())? {
      Some((data, fetched_at)) => {
        let value = decode(data, key)?;
        Ok(Some(FetchOutcome::from_cache(value, fetched_at)))
      }
      None => Ok(None),
    }
  }

  async fn key_lock(&self, slot: &str) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = self.locks.lock().await;
    locks
      .entry(slot.to_string())
      .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
      .clone()
  }

  fn lookup(&self, slot: &str) -> Result<Option<(serde_json::Value, DateTime<Utc>)>> {
    let entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(entries.get(slot).map(|e| (e.data.clone(), e.fetched_at)))
  }

  fn store<K: FetchKey, T: Serialize>(&self, slot: &str, value: &T, key: &K) -> Result<()> {
    let data = serde_json::to_value(value)
      .map_err(|e| eyre!("Failed to serialize value for {}: {}", key.description(), e))?;
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    entries.insert(
      slot.to_string(),
      CacheEntry {
        data,
        fetched_at: Utc::now(),
      },
    );
    Ok(())
  }
}

impl Default for CacheService {
  fn default() -> Self {
    Self::new()
  }
}

fn decode<K: FetchKey, T: DeserializeOwned>(data: serde_json::Value, key: &K) -> Result<T> {
  serde_json::from_value(data)
    .map_err(|e| eyre!("Failed to deserialize cached value for {}: {}", key.description(), e))
}

/// Result of a cached fetch, including metadata about where the value
/// came from.
#[derive(Debug, Clone)]
pub struct FetchOutcome<T> {
  /// The actual value
  pub data: T,
  /// Where the value came from
  pub source: FetchSource,
  /// When the value was cached (if from cache)
  pub fetched_at: Option<DateTime<Utc>>,
  /// Producer failure message when serving a stale value
  pub error: Option<String>,
}

impl<T> FetchOutcome<T> {
  /// Fresh value straight from the producer.
  fn from_producer(data: T) -> Self {
    Self {
      data,
      source: FetchSource::Producer,
      fetched_at: None,
      error: None,
    }
  }

  /// Value served from a non-expired cache entry.
  fn from_cache(data: T, fetched_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: FetchSource::Cache,
      fetched_at: Some(fetched_at),
      error: None,
    }
  }

  /// Expired value served because the producer failed.
  fn stale(data: T, fetched_at: DateTime<Utc>, error: &color_eyre::Report) -> Self {
    Self {
      data,
      source: FetchSource::Stale,
      fetched_at: Some(fetched_at),
      error: Some(error.to_string()),
    }
  }
}

/// Indicates where a fetched value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
  /// Fresh value from the producer
  Producer,
  /// Value from cache, still within its TTL
  Cache,
  /// Expired value from cache, producer failed
  Stale,
}
