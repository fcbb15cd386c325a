//! Draft autosave for form state.
//!
//! Mirrors a caller's in-progress form value into a durable key-value
//! store after a quiet period, offers the last snapshot back for
//! restoration on the next visit, and clears it once the form is
//! submitted for real.

mod saver;
mod storage;

pub use saver::{DraftSaver, DraftSnapshot};
pub use storage::{DraftStore, MemoryDraftStore, SqliteDraftStore};
