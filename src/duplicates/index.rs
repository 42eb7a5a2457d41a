//! Concurrent size index.
//!
//! The index maps a file length to every record of that length. It is
//! split into shards, each behind its own [`parking_lot::Mutex`], so
//! indexer threads inserting records of different lengths rarely contend.
//! A record's shard is derived from its length alone, which keeps every
//! record of one length in one shard.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::groups::{finish_buckets, GroupingStats, SizeBucket};
use crate::scanner::FileRecord;

/// Default number of shards.
pub const DEFAULT_SHARDS: usize = 64;

type Shard = HashMap<u64, Vec<FileRecord>>;

/// Sharded map from length to records.
#[derive(Debug)]
pub struct SizeIndex {
    shards: Vec<Mutex<Shard>>,
}

impl Default for SizeIndex {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}

impl SizeIndex {
    /// Create an index with `shards` shards (at least one).
    #[must_use]
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect();
        Self { shards }
    }

    /// Number of shards.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_for(&self, length: u64) -> &Mutex<Shard> {
        // Fibonacci hashing spreads small, clustered lengths across shards
        let mixed = length.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 32;
        &self.shards[(mixed as usize) % self.shards.len()]
    }

    /// Add a record under its length.
    pub fn insert(&self, record: FileRecord) {
        let mut shard = self.shard_for(record.length).lock();
        shard.entry(record.length).or_default().push(record);
    }

    /// Number of records indexed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().values().map(Vec::len).sum::<usize>())
            .sum()
    }

    /// Check if nothing has been indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.lock().is_empty())
    }

    /// Consume the index and return the candidate buckets.
    ///
    /// Buckets with a single member are pruned. Members are sorted by path
    /// and buckets by length, so output does not depend on insertion order.
    #[must_use]
    pub fn into_candidates(self) -> (Vec<SizeBucket>, GroupingStats) {
        let mut stats = GroupingStats::default();

        let by_length: Vec<(u64, Vec<FileRecord>)> = self
            .shards
            .into_iter()
            .flat_map(|shard| shard.into_inner())
            .inspect(|(length, members)| {
                stats.total_files += members.len();
                stats.total_size += length * members.len() as u64;
                if *length == 0 {
                    stats.empty_files += members.len();
                }
            })
            .collect();

        let buckets = finish_buckets(by_length, &mut stats);
        (buckets, stats)
    }
}
