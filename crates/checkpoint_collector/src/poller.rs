use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use checkpoint_primitives::{Checkpoint, ParseError, parse_checkpoint};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CollectorConfig;
use crate::net::{ContentSource, SourceError};
use crate::store::{CheckpointStore, InsertOutcome};

/// Why a poll cycle produced no checkpoint.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("unable to fetch checkpoint: {0}")]
    Fetch(#[from] SourceError),
    #[error("invalid checkpoint record: {0}")]
    Parse(#[from] ParseError),
}

/// Fetches and parses the current checkpoint record once, bounded by `timeout`.
pub async fn fetch_checkpoint<S: ContentSource + ?Sized>(
    source: &S,
    address: &str,
    filename: &str,
    timeout: Duration,
) -> Result<Checkpoint, CollectError> {
    let raw = tokio::time::timeout(timeout, source.fetch_named_file(address, filename))
        .await
        .map_err(|_| SourceError::Timeout(timeout))??;
    Ok(parse_checkpoint(&raw)?)
}

/// Poller counters, updated by the collection task and readable from lookups.
#[derive(Debug, Default)]
pub struct CollectorStats {
    cycles: AtomicU64,
    fetch_failures: AtomicU64,
    parse_failures: AtomicU64,
    inserted: AtomicU64,
    duplicates: AtomicU64,
}

/// Point-in-time copy of `CollectorStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub fetch_failures: u64,
    pub parse_failures: u64,
    pub inserted: u64,
    pub duplicates: u64,
}

impl CollectorStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            inserted: self.inserted.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything the poll loop owns. It is the only writer of `store`.
pub(crate) struct Poller<S: ?Sized> {
    pub(crate) source: Arc<S>,
    pub(crate) address: String,
    pub(crate) config: CollectorConfig,
    pub(crate) store: Arc<CheckpointStore>,
    pub(crate) stats: Arc<CollectorStats>,
}

impl<S: ContentSource + ?Sized> Poller<S> {
    /// Runs fetch → parse → insert → sleep until `cancel` fires.
    ///
    /// Every failure is logged and retried on the next tick; nothing here ends the loop
    /// except cancellation.
    pub(crate) async fn run(self, cancel: CancellationToken) {
        info!(
            address = %self.address,
            path = %self.config.data_path.display(),
            interval = ?self.config.interval,
            "Start checking for checkpoints"
        );

        while !cancel.is_cancelled() {
            let fetched = tokio::select! {
                _ = cancel.cancelled() => break,
                res = fetch_checkpoint(
                    self.source.as_ref(),
                    &self.address,
                    &self.config.filename,
                    self.config.fetch_timeout,
                ) => res,
            };
            self.record(fetched);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        debug!(address = %self.address, "checkpoint poller stopped");
    }

    fn record(&self, fetched: Result<Checkpoint, CollectError>) {
        CollectorStats::bump(&self.stats.cycles);

        let checkpoint = match fetched {
            Ok(cp) => cp,
            Err(CollectError::Fetch(e)) => {
                CollectorStats::bump(&self.stats.fetch_failures);
                debug!("Unable to fetch checkpoint, trying again later: {e}");
                return;
            }
            Err(CollectError::Parse(e)) => {
                CollectorStats::bump(&self.stats.parse_failures);
                warn!("Discarding checkpoint record: {e}");
                return;
            }
        };

        let height = checkpoint.height();
        let hash = checkpoint.hash().to_string();
        match self.store.insert_checkpoint(checkpoint) {
            InsertOutcome::Duplicate => {
                CollectorStats::bump(&self.stats.duplicates);
                debug!("Checkpoint at height {height} already cached");
            }
            InsertOutcome::Added { evicted } => {
                CollectorStats::bump(&self.stats.inserted);
                if let Some(old) = evicted {
                    debug!("Evicted checkpoint at height {old}");
                }
                info!(
                    "Cached new checkpoint at height {height} with hash {hash}. Total cached checkpoints: {}",
                    self.store.len()
                );
            }
        }
    }
}
