//! Lock-striped memo map shared by resolver threads.
//!
//! Keys are spread over a power-of-two number of `RwLock<HashMap>` shards so
//! that concurrent lookups of different references rarely touch the same
//! lock. Values are computed outside any lock; when two threads race on the
//! same key the first insert wins and both observe the stored value.

use parking_lot::RwLock;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of memo performance counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    /// Total number of memo lookups
    pub lookups: u64,
    /// Number of lookups answered from the memo
    pub hits: u64,
    /// Number of lookups that had to compute a value
    pub misses: u64,
}

impl MemoStats {
    /// Calculate the hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }
}

/// Concurrent compute-if-absent map.
#[derive(Debug)]
pub struct StripedMemo<K, V> {
    shards: Box<[RwLock<HashMap<K, V>>]>,
    hasher: RandomState,
    lookups: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> StripedMemo<K, V>
where
    K: Hash + Eq + Clone,
    V: Copy,
{
    /// Creates a memo with `shards` stripes, rounded up to a power of two.
    pub fn new(shards: usize) -> Self {
        let shards = shards.max(1).next_power_of_two();
        Self {
            shards: (0..shards).map(|_| RwLock::new(HashMap::new())).collect(),
            hasher: RandomState::new(),
            lookups: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn shard(&self, key: &K) -> &RwLock<HashMap<K, V>> {
        let index = self.hasher.hash_one(key) as usize & (self.shards.len() - 1);
        &self.shards[index]
    }

    /// Returns the memoized value for `key`, computing it with `compute` on
    /// the first request.
    ///
    /// `compute` runs without holding any shard lock, so it may itself
    /// consult the memo.
    pub fn get_or_insert_with(&self, key: &K, compute: impl FnOnce() -> V) -> V {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let shard = self.shard(key);
        if let Some(value) = shard.read().get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *value;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute();
        *shard.write().entry(key.clone()).or_insert(value)
    }

    /// Returns the memoized value for `key` without computing it.
    pub fn get(&self, key: &K) -> Option<V> {
        self.shard(key).read().get(key).copied()
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// Returns true if nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Number of lock stripes.
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Current performance counters.
    pub fn stats(&self) -> MemoStats {
        MemoStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drops every memoized entry and resets the counters.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().clear();
        }
        self.lookups.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
