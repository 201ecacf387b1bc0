//! Start/stop lifecycle for checkpoint collection.
//!
//! `start_collection` spawns the poller and hands back an owned handle. The
//! `CheckpointCollection` service wraps that for hosts that want a single
//! start-once, look-up-anywhere object: it refuses a second start, and once stopped
//! it stays stopped.
use std::mem;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::CollectorConfig;
use crate::lookup::CheckpointLookup;
use crate::net::ContentSource;
use crate::poller::{CollectorStats, Poller};
use crate::store::CheckpointStore;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("checkpoint collection is already running")]
    AlreadyStarted,
    #[error("checkpoint collection was stopped")]
    Stopped,
    #[error("checkpoint collection needs a Tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionState {
    NotStarted,
    Running,
    Stopped,
}

/// A running poller. Dropping the handle cancels the poller without waiting for it.
#[derive(Debug)]
pub struct CollectionHandle {
    lookup: CheckpointLookup,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// Spawns a poller for `address` on the current Tokio runtime.
pub fn start_collection<S>(
    source: Arc<S>,
    config: CollectorConfig,
    address: impl Into<String>,
) -> Result<CollectionHandle, CollectionError>
where
    S: ContentSource + ?Sized + 'static,
{
    let runtime = tokio::runtime::Handle::try_current()?;

    let store = Arc::new(CheckpointStore::new(config.capacity));
    let stats = Arc::new(CollectorStats::default());
    let lookup = CheckpointLookup::new(Arc::clone(&store), Arc::clone(&stats));

    let poller = Poller {
        source,
        address: address.into(),
        config,
        store,
        stats,
    };
    let cancel = CancellationToken::new();
    let task = runtime.spawn(poller.run(cancel.clone()));

    Ok(CollectionHandle {
        lookup,
        cancel,
        task: Some(task),
    })
}

impl CollectionHandle {
    pub fn lookup(&self) -> CheckpointLookup {
        self.lookup.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancels the poller and waits for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("checkpoint poller ended abnormally: {e}");
        }
    }
}

impl Drop for CollectionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum Slot {
    NotStarted,
    Running(CollectionHandle),
    Stopped,
}

/// Process-level checkpoint collection: one source, at most one poller, ever.
pub struct CheckpointCollection<S: ?Sized> {
    source: Arc<S>,
    config: CollectorConfig,
    slot: Mutex<Slot>,
    lookup: OnceLock<CheckpointLookup>,
}

impl<S: ContentSource + ?Sized + 'static> CheckpointCollection<S> {
    pub fn new(source: Arc<S>, config: CollectorConfig) -> Self {
        CheckpointCollection {
            source,
            config,
            slot: Mutex::new(Slot::NotStarted),
            lookup: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Starts polling `source_address`. Only the first call on a collection succeeds.
    pub fn start(&self, source_address: &str) -> Result<CheckpointLookup, CollectionError> {
        let mut slot = self.slot.lock();
        match *slot {
            Slot::NotStarted => {}
            Slot::Running(_) => return Err(CollectionError::AlreadyStarted),
            Slot::Stopped => return Err(CollectionError::Stopped),
        }

        let handle = start_collection(
            Arc::clone(&self.source),
            self.config.clone(),
            source_address,
        )?;
        let lookup = handle.lookup();
        // The slot lock makes this the only set.
        let _ = self.lookup.set(lookup.clone());
        *slot = Slot::Running(handle);
        Ok(lookup)
    }

    pub fn state(&self) -> CollectionState {
        match *self.slot.lock() {
            Slot::NotStarted => CollectionState::NotStarted,
            Slot::Running(_) => CollectionState::Running,
            Slot::Stopped => CollectionState::Stopped,
        }
    }

    /// Handle onto the cache, once collection has been started.
    pub fn lookup(&self) -> Option<CheckpointLookup> {
        self.lookup.get().cloned()
    }

    /// Cached hash at `height`, or an empty string if it is not cached (or collection
    /// never started).
    pub fn checkpoint_at(&self, height: u64) -> String {
        self.lookup
            .get()
            .map(|l| l.checkpoint_at_or_empty(height))
            .unwrap_or_default()
    }

    /// Stops the poller, if any, and waits for it. The collection cannot be restarted.
    pub async fn stop(&self) {
        let previous = mem::replace(&mut *self.slot.lock(), Slot::Stopped);
        if let Slot::Running(handle) = previous {
            handle.stop().await;
            info!("Checkpoint collection stopped");
        }
    }
}
