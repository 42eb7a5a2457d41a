//! Cheap pre-checks run before full hashing.
//!
//! A [`Prefilter`] computes a fingerprint that is equal for identical files
//! and usually different for files that merely share a length. The resolver
//! splits each bucket by fingerprint and only fully hashes sub-buckets that
//! still have two or more members. A prefilter never changes the result of a
//! scan, only how much data is read to get there.

use std::fmt::Debug;

use crate::scanner::{FileRecord, Hash, HashError, Hasher, PREHASH_SIZE};

/// Strategy for splitting a size bucket before full hashing.
pub trait Prefilter: Send + Sync + Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the pre-check is worth running for files of this length.
    fn applies_to(&self, length: u64) -> bool;

    /// Fingerprint of a single file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read.
    fn fingerprint(&self, hasher: &Hasher, record: &FileRecord) -> Result<Hash, HashError>;
}

/// Hash of the leading bytes of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialHashPrefilter {
    bytes: u64,
}

impl Default for PartialHashPrefilter {
    fn default() -> Self {
        Self::new(PREHASH_SIZE)
    }
}

impl PartialHashPrefilter {
    /// Create a prefilter reading `bytes` leading bytes (at least 1).
    #[must_use]
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes: bytes.max(1),
        }
    }

    /// Number of leading bytes hashed.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Prefilter for PartialHashPrefilter {
    fn name(&self) -> &'static str {
        "partial-hash"
    }

    // For shorter files the full hash reads exactly the same bytes
    fn applies_to(&self, length: u64) -> bool {
        length > self.bytes
    }

    fn fingerprint(&self, hasher: &Hasher, record: &FileRecord) -> Result<Hash, HashError> {
        hasher.partial_hash(&record.path, self.bytes)
    }
}
