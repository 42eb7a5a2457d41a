//! Size buckets and confirmed duplicate groups.
//!
//! # Overview
//!
//! Grouping by length is the first filter of duplicate detection: files
//! of different lengths can never be identical, so only buckets with two
//! or more members are worth hashing.
//!
//! # Example
//!
//! ```
//! use duplicates::scanner::FileRecord;
//! use duplicates::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (buckets, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(buckets.len(), 1);
//! ```

use std::collections::HashMap;

use crate::scanner::{FileRecord, Hash};

/// Files sharing one exact length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBucket {
    /// Length in bytes shared by every member
    pub length: u64,
    /// Members in resolution order
    pub members: Vec<FileRecord>,
}

impl SizeBucket {
    /// Create a bucket from its members.
    #[must_use]
    pub fn new(length: u64, members: Vec<FileRecord>) -> Self {
        debug_assert!(
            members.iter().all(|m| m.length == length),
            "bucket member length mismatch"
        );
        Self { length, members }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the bucket has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// A bucket is a candidate once it has at least two members.
    #[must_use]
    pub fn is_candidate(&self) -> bool {
        self.members.len() > 1
    }

    /// Sort members by path so resolution order is reproducible.
    pub fn sort_members(&mut self) {
        self.members.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

/// Files confirmed to have identical content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestGroup {
    /// Length in bytes shared by every member
    pub length: u64,
    /// Content digest shared by every member
    pub digest: Hash,
    /// Members, each carrying `digest`
    pub members: Vec<FileRecord>,
}

impl DigestGroup {
    /// Create a group, stamping the digest onto members that lack it.
    #[must_use]
    pub fn new(length: u64, digest: Hash, members: Vec<FileRecord>) -> Self {
        let members = members
            .into_iter()
            .map(|m| {
                if m.digest().is_some() {
                    m
                } else {
                    m.with_digest(digest)
                }
            })
            .collect();
        Self {
            length,
            digest,
            members,
        }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Bytes reclaimable by keeping a single copy.
    #[must_use]
    pub fn wasted_bytes(&self) -> u64 {
        self.length * (self.members.len().saturating_sub(1) as u64)
    }

    /// Lexicographically smallest member path.
    #[must_use]
    pub fn first_path(&self) -> Option<&std::path::Path> {
        self.members.iter().map(|m| m.path.as_path()).min()
    }

    /// Whether `path` is one of the members.
    #[must_use]
    pub fn contains(&self, path: &std::path::Path) -> bool {
        self.members.iter().any(|m| m.path == path)
    }
}

/// Statistics from size grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Files seen
    pub total_files: usize,
    /// Sum of their lengths
    pub total_size: u64,
    /// Zero-length files seen
    pub empty_files: usize,
    /// Distinct lengths seen
    pub unique_sizes: usize,
    /// Files dropped because no other file shares their length
    pub eliminated_unique: usize,
    /// Files in candidate buckets
    pub potential_duplicates: usize,
    /// Number of candidate buckets
    pub candidate_buckets: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size alone.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Turn a length map into sorted candidate buckets, updating `stats`.
///
/// Singleton buckets are pruned, members are sorted by path and buckets by
/// length.
pub(crate) fn finish_buckets(
    by_length: impl IntoIterator<Item = (u64, Vec<FileRecord>)>,
    stats: &mut GroupingStats,
) -> Vec<SizeBucket> {
    let mut buckets: Vec<SizeBucket> = Vec::new();

    for (length, members) in by_length {
        stats.unique_sizes += 1;
        if members.len() < 2 {
            stats.eliminated_unique += members.len();
            if let Some(only) = members.first() {
                log::trace!("Eliminated unique size {}: {}", length, only.path.display());
            }
            continue;
        }

        log::debug!(
            "Size bucket {} bytes: {} potential duplicates",
            length,
            members.len()
        );
        stats.potential_duplicates += members.len();
        stats.candidate_buckets += 1;

        let mut bucket = SizeBucket::new(length, members);
        bucket.sort_members();
        buckets.push(bucket);
    }

    buckets.sort_by_key(|b| b.length);
    buckets
}

/// Group files by length on the calling thread.
///
/// Produces the same output as the sharded
/// [`SizeIndex`](super::index::SizeIndex): candidate buckets only, members
/// sorted by path, buckets sorted by length. Zero-length files are grouped
/// like any other length.
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileRecord>,
) -> (Vec<SizeBucket>, GroupingStats) {
    let mut by_length: HashMap<u64, Vec<FileRecord>> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.length;
        if file.length == 0 {
            stats.empty_files += 1;
        }
        by_length.entry(file.length).or_default().push(file);
    }

    let buckets = finish_buckets(by_length, &mut stats);

    log::info!(
        "Size grouping complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (buckets, stats)
}
