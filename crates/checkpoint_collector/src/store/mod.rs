//! In-memory checkpoint cache.
//!
//! Holds the `N` highest checkpoint heights seen since collection started. Heights
//! stand in for recency, so the smallest height is evicted first regardless of the
//! order in which records arrived. Nothing is persisted.
pub mod bounded;

pub use bounded::{CheckpointStore, DEFAULT_CAPACITY, InsertOutcome};
