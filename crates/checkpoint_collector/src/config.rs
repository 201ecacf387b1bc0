use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_CAPACITY;

/// Well-known file a checkpoint site publishes its latest record in.
pub const DEFAULT_CHECKPOINT_FILE: &str = "index.html";
/// Pause between two poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);
/// Upper bound on a single fetch; site syncs routinely take a few seconds.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);
/// Directory, under the storage path, that checkpoint site data lives in.
pub const CHECKPOINT_DATA_DIR: &str = "zn-checkpoints";

/// Settings for one checkpoint collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Where site data for the checkpoint source is kept.
    pub data_path: PathBuf,
    pub filename: String,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
    pub capacity: NonZeroUsize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            data_path: Path::new("./data").join(CHECKPOINT_DATA_DIR),
            filename: DEFAULT_CHECKPOINT_FILE.to_string(),
            interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CollectorConfig {
    /// Defaults, with site data kept under `storage_path`.
    pub fn with_storage_path<P: AsRef<Path>>(storage_path: P) -> Self {
        Self {
            data_path: storage_path.as_ref().join(CHECKPOINT_DATA_DIR),
            ..Self::default()
        }
    }
}
