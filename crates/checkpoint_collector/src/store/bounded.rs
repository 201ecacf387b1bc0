use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use checkpoint_primitives::Checkpoint;
use parking_lot::RwLock;

/// Number of checkpoints kept when no capacity is configured.
pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// Result of `CheckpointStore::insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The height was new. `evicted` is the height dropped to stay within capacity,
    /// which may be the inserted height itself if it was the oldest.
    Added { evicted: Option<u64> },
    /// The height was already cached; nothing changed.
    Duplicate,
}

/// Bounded height → hash map guarded by a reader/writer lock.
///
/// Entries are never modified once inserted. Readers share the lock and only
/// contend with the single writer for the duration of one insertion.
#[derive(Debug)]
pub struct CheckpointStore {
    capacity: NonZeroUsize,
    entries: RwLock<BTreeMap<u64, String>>,
}

impl Default for CheckpointStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CheckpointStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        CheckpointStore {
            capacity,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Adds `height → hash` unless `height` is already present, then evicts the
    /// smallest height if the store went over capacity.
    pub fn insert(&self, height: u64, hash: impl Into<String>) -> InsertOutcome {
        let mut entries = self.entries.write();
        if entries.contains_key(&height) {
            return InsertOutcome::Duplicate;
        }

        entries.insert(height, hash.into());
        let evicted = if entries.len() > self.capacity.get() {
            entries.pop_first().map(|(h, _)| h)
        } else {
            None
        };
        InsertOutcome::Added { evicted }
    }

    pub fn insert_checkpoint(&self, checkpoint: Checkpoint) -> InsertOutcome {
        let (height, hash) = checkpoint.into_parts();
        self.insert(height, hash)
    }

    pub fn get(&self, height: u64) -> Option<String> {
        self.entries.read().get(&height).cloned()
    }

    pub fn contains(&self, height: u64) -> bool {
        self.entries.read().contains_key(&height)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Cached heights in ascending order.
    pub fn heights(&self) -> Vec<u64> {
        self.entries.read().keys().copied().collect()
    }

    /// The checkpoint with the highest cached height.
    pub fn latest(&self) -> Option<Checkpoint> {
        let entries = self.entries.read();
        let (height, hash) = entries.last_key_value()?;
        Checkpoint::new(*height, hash).ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use super::*;

    fn store(capacity: usize) -> CheckpointStore {
        CheckpointStore::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn never_exceeds_capacity() {
        let s = store(4);
        // Mixed order, with repeats.
        let heights = [10, 3, 7, 10, 1, 12, 5, 12, 20, 2, 15, 7, 30];
        for h in heights {
            s.insert(h, format!("hash-{h}"));
            assert!(s.len() <= 4, "len {} after inserting {h}", s.len());
        }
        assert_eq!(s.heights(), vec![12, 15, 20, 30]);
    }

    #[test]
    fn evicts_smallest_height() {
        let s = store(10);
        for h in 0..=10u64 {
            s.insert(100 + h, format!("hash-{h}"));
        }
        assert_eq!(s.len(), 10);
        assert_eq!(s.get(100), None);
        for h in 1..=10u64 {
            assert_eq!(s.get(100 + h), Some(format!("hash-{h}")));
        }
    }

    #[test]
    fn late_arrival_keeps_highest_heights() {
        let s = store(3);
        for h in [50, 60, 70] {
            s.insert(h, "x");
        }
        // An older checkpoint showing up late is evicted straight away.
        assert_eq!(
            s.insert(40, "late"),
            InsertOutcome::Added { evicted: Some(40) }
        );
        assert_eq!(s.heights(), vec![50, 60, 70]);

        assert_eq!(
            s.insert(55, "retry"),
            InsertOutcome::Added { evicted: Some(50) }
        );
        assert_eq!(s.heights(), vec![55, 60, 70]);
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let s = store(10);
        assert_eq!(
            s.insert(100, "abc123"),
            InsertOutcome::Added { evicted: None }
        );
        assert_eq!(s.insert(100, "abc123"), InsertOutcome::Duplicate);
        assert_eq!(s.insert(100, "other"), InsertOutcome::Duplicate);
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(100).as_deref(), Some("abc123"));
    }

    #[test]
    fn miss_before_and_after_population() {
        let s = store(10);
        assert!(s.is_empty());
        assert_eq!(s.get(42), None);
        assert_eq!(s.latest(), None);

        s.insert(41, "a");
        s.insert(43, "b");
        assert_eq!(s.get(42), None);
        assert!(!s.contains(42));
        assert_eq!(s.latest(), Some(Checkpoint::new(43, "b").unwrap()));
    }

    #[test]
    fn insert_checkpoint_splits_pair() {
        let s = CheckpointStore::default();
        assert_eq!(s.capacity(), 10);
        s.insert_checkpoint(Checkpoint::new(9, "nine").unwrap());
        assert_eq!(s.get(9).as_deref(), Some("nine"));
    }

    #[test]
    fn concurrent_readers_see_whole_entries() {
        const WRITES: u64 = 1000;
        const READERS: usize = 50;

        let s = Arc::new(store(10));
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..READERS)
            .map(|r| {
                let s = Arc::clone(&s);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut hits = 0u64;
                    let mut h = r as u64;
                    while !done.load(Ordering::Acquire) {
                        if let Some(hash) = s.get(h % WRITES) {
                            assert_eq!(hash, format!("hash-{}", h % WRITES));
                            hits += 1;
                        }
                        assert!(s.len() <= 10);
                        h = h.wrapping_mul(31).wrapping_add(7);
                    }
                    hits
                })
            })
            .collect();

        for h in 0..WRITES {
            s.insert(h, format!("hash-{h}"));
        }
        done.store(true, Ordering::Release);

        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(s.heights(), (WRITES - 10..WRITES).collect::<Vec<_>>());
    }
}
