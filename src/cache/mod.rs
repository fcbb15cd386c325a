//! Shared cached-fetch layer for backend reads.
//!
//! This module provides a backend-agnostic caching mechanism that:
//! - Memoizes arbitrary asynchronous reads behind a string key
//! - Expires entries per key after a time-to-live
//! - Serves the previous value when a refetch fails (stale-on-error)
//! - Coalesces concurrent fetches for the same key into one producer call

mod key;
mod service;

pub use key::{FetchKey, ResourceKey};
pub use service::{CacheService, FetchOutcome, FetchSource};
