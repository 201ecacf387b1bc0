use std::sync::Arc;

use checkpoint_primitives::Checkpoint;
use tracing::debug;

use crate::poller::{CollectorStats, StatsSnapshot};
use crate::store::CheckpointStore;

/// Read-only handle onto a running (or stopped) collection's cache.
///
/// Cheap to clone and safe to share across threads. Lookups only take the read
/// side of the store lock and never touch the network.
#[derive(Debug, Clone)]
pub struct CheckpointLookup {
    store: Arc<CheckpointStore>,
    stats: Arc<CollectorStats>,
}

impl CheckpointLookup {
    pub(crate) fn new(store: Arc<CheckpointStore>, stats: Arc<CollectorStats>) -> Self {
        CheckpointLookup { store, stats }
    }

    /// Hash of the cached checkpoint at `height`, if any.
    pub fn checkpoint_at(&self, height: u64) -> Option<String> {
        debug!("Getting checkpoint at height: {height}");
        self.store.get(height)
    }

    /// Like `checkpoint_at`, but reports a miss as an empty string.
    pub fn checkpoint_at_or_empty(&self, height: u64) -> String {
        self.checkpoint_at(height).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn heights(&self) -> Vec<u64> {
        self.store.heights()
    }

    pub fn latest(&self) -> Option<Checkpoint> {
        self.store.latest()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
