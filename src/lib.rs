//! Client-core utilities for the Young Minds @ Edura app.
//!
//! The application itself is a thin UI over a managed backend; what
//! lives here are the reusable pieces every screen leans on:
//!
//! - [`cache`]: TTL-cached fetching of backend reads, shared across
//!   call sites, with stale-on-error fallback
//! - [`drafts`]: debounced autosave of in-progress form values with
//!   restoration on the next visit
//! - [`forms`]: declarative field validation with touched gating
//!
//! None of these modules talk to the backend themselves - the cache
//! invokes a caller-supplied producer, drafts write to a local store,
//! and validation is pure. Failures are converted to data at each
//! boundary rather than propagated as panics.

pub mod cache;
pub mod config;
pub mod drafts;
pub mod forms;

pub use cache::{CacheService, FetchKey, FetchOutcome, FetchSource, ResourceKey};
pub use config::Config;
pub use drafts::{DraftSaver, DraftSnapshot, DraftStore, MemoryDraftStore, SqliteDraftStore};
pub use forms::{FieldRules, FieldValues, FormState};
