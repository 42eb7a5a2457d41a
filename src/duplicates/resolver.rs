//! Candidate resolution: turning size buckets into confirmed duplicate groups.
//!
//! # Overview
//!
//! Each candidate bucket is resolved independently:
//!
//! 1. **Zero length** - every member is identical, no file is opened
//! 2. **Pre-check** - an optional [`Prefilter`] splits the bucket by a cheap
//!    fingerprint and singletons are dropped
//! 3. **Full hash** - remaining members are hashed in full and partitioned by
//!    digest, keeping members in the order they were hashed
//! 4. **Prune** - partitions with a single member are dropped
//!
//! A member that cannot be read is excluded and reported as a
//! [`ScanWarning`]; the rest of its bucket is still resolved. Running out of
//! file descriptors and shutdown are the only conditions that abort.
//!
//! # Example
//!
//! ```no_run
//! use duplicates::duplicates::{group_by_size, CandidateResolver};
//! use duplicates::scanner::{FileRecord, Hasher};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/tmp/a.txt"), 5),
//!     FileRecord::new(PathBuf::from("/tmp/b.txt"), 5),
//! ];
//! let (buckets, _) = group_by_size(files);
//!
//! let resolver = CandidateResolver::new(Arc::new(Hasher::new()));
//! let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
//! let resolved = resolver.resolve_all(buckets, &pool).unwrap();
//! println!("{} duplicate groups", resolved.groups.len());
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::groups::{DigestGroup, SizeBucket};
use super::prefilter::{PartialHashPrefilter, Prefilter};
use crate::progress::{ProgressCallback, PHASE_RESOLVING};
use crate::scanner::{hash_to_hex, FileRecord, Hash, HashError, Hasher, ScanWarning};

/// Conditions that abort resolution of every bucket.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// Shutdown was requested.
    #[error("Resolution interrupted")]
    Interrupted,

    /// The process ran out of file descriptors.
    #[error("Out of file descriptors: {0}")]
    ResourceExhausted(#[source] HashError),
}

/// Counters for one or more resolved buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Buckets resolved
    pub buckets: usize,
    /// Files fingerprinted by the prefilter
    pub prefiltered_files: usize,
    /// Files dropped because their fingerprint was unique
    pub eliminated_by_prefilter: usize,
    /// Files hashed in full
    pub files_hashed: usize,
    /// Bytes read by full hashing
    pub bytes_hashed: u64,
    /// Files whose full digest was unique
    pub eliminated_by_hash: usize,
    /// Files excluded because they could not be read
    pub failed_files: usize,
}

impl ResolverStats {
    /// Add another set of counters to this one.
    pub fn merge(&mut self, other: &Self) {
        self.buckets += other.buckets;
        self.prefiltered_files += other.prefiltered_files;
        self.eliminated_by_prefilter += other.eliminated_by_prefilter;
        self.files_hashed += other.files_hashed;
        self.bytes_hashed += other.bytes_hashed;
        self.eliminated_by_hash += other.eliminated_by_hash;
        self.failed_files += other.failed_files;
    }
}

/// Outcome of resolving one or more buckets.
#[derive(Debug, Clone, Default)]
pub struct BucketResolution {
    /// Confirmed duplicate groups, each with two or more members
    pub groups: Vec<DigestGroup>,
    /// Members excluded because of a read failure
    pub warnings: Vec<ScanWarning>,
    /// Work counters
    pub stats: ResolverStats,
}

impl BucketResolution {
    fn absorb(&mut self, other: Self) {
        self.groups.extend(other.groups);
        self.warnings.extend(other.warnings);
        self.stats.merge(&other.stats);
    }
}

/// Resolves size buckets into digest groups.
pub struct CandidateResolver {
    hasher: Arc<Hasher>,
    prefilter: Option<Arc<dyn Prefilter>>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
    completed: AtomicUsize,
}

impl std::fmt::Debug for CandidateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateResolver")
            .field("hasher", &self.hasher)
            .field("prefilter", &self.prefilter)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl CandidateResolver {
    /// Create a resolver using the default [`PartialHashPrefilter`].
    #[must_use]
    pub fn new(hasher: Arc<Hasher>) -> Self {
        Self {
            hasher,
            prefilter: Some(Arc::new(PartialHashPrefilter::default())),
            shutdown_flag: None,
            progress_callback: None,
            completed: AtomicUsize::new(0),
        }
    }

    /// Replace the pre-check strategy.
    #[must_use]
    pub fn with_prefilter(mut self, prefilter: Arc<dyn Prefilter>) -> Self {
        self.prefilter = Some(prefilter);
        self
    }

    /// Go straight from size buckets to full hashing.
    #[must_use]
    pub fn without_prefilter(mut self) -> Self {
        self.prefilter = None;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Resolve every bucket on `pool`, one bucket per task.
    ///
    /// Groups come back in bucket order.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] on shutdown or descriptor exhaustion.
    pub fn resolve_all(
        &self,
        buckets: Vec<SizeBucket>,
        pool: &rayon::ThreadPool,
    ) -> Result<BucketResolution, ResolveError> {
        let total_files: usize = buckets.iter().map(SizeBucket::len).sum();
        log::info!(
            "Resolving {} candidate buckets ({} files) on {} threads",
            buckets.len(),
            total_files,
            pool.current_num_threads()
        );

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(PHASE_RESOLVING, buckets.len());
        }
        self.completed.store(0, Ordering::Relaxed);

        let results: Result<Vec<BucketResolution>, ResolveError> = pool.install(|| {
            buckets
                .into_par_iter()
                .map(|bucket| self.resolve_bucket(bucket))
                .collect()
        });

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(PHASE_RESOLVING);
        }

        let mut merged = BucketResolution::default();
        for resolution in results? {
            merged.absorb(resolution);
        }

        log::info!(
            "Resolution complete: {} groups, {} files hashed ({} eliminated by pre-check)",
            merged.groups.len(),
            merged.stats.files_hashed,
            merged.stats.eliminated_by_prefilter
        );

        Ok(merged)
    }

    /// Resolve a single bucket.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] on shutdown or descriptor exhaustion.
    pub fn resolve_bucket(&self, bucket: SizeBucket) -> Result<BucketResolution, ResolveError> {
        if self.is_shutdown_requested() {
            return Err(ResolveError::Interrupted);
        }

        let mut resolution = BucketResolution {
            stats: ResolverStats {
                buckets: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let length = bucket.length;
        let progress_path = bucket
            .members
            .first()
            .map(|m| m.path.to_string_lossy().into_owned())
            .unwrap_or_default();

        if bucket.len() < 2 {
            self.report_progress(&progress_path);
            return Ok(resolution);
        }

        if length == 0 {
            log::debug!("Bucket of {} empty files resolved without hashing", bucket.len());
            resolution
                .groups
                .push(DigestGroup::new(0, Hasher::empty_digest(), bucket.members));
            self.report_progress(&progress_path);
            return Ok(resolution);
        }

        let sub_buckets = match self.prefilter {
            Some(ref prefilter) if prefilter.applies_to(length) => {
                resolution.stats.prefiltered_files += bucket.len();
                let partitions = self.partition(bucket.members, &mut resolution, |record| {
                    prefilter.fingerprint(&self.hasher, record)
                })?;

                let mut survivors = Vec::new();
                for (_, members) in partitions {
                    if members.len() < 2 {
                        resolution.stats.eliminated_by_prefilter += members.len();
                    } else {
                        survivors.push(members);
                    }
                }
                log::debug!(
                    "Bucket {} bytes: {} sub-buckets after {}",
                    length,
                    survivors.len(),
                    prefilter.name()
                );
                survivors
            }
            _ => vec![bucket.members],
        };

        for members in sub_buckets {
            let partitions = self.partition(members, &mut resolution, |record| {
                let digest = self.hasher.full_hash_expecting(&record.path, length)?;
                if let Some(ref callback) = self.progress_callback {
                    callback.on_item_completed(length);
                }
                Ok(digest)
            })?;

            for (digest, members) in partitions {
                resolution.stats.files_hashed += members.len();
                resolution.stats.bytes_hashed += length * members.len() as u64;
                if members.len() < 2 {
                    resolution.stats.eliminated_by_hash += members.len();
                    continue;
                }
                log::debug!(
                    "Duplicate group {}: {} files of {} bytes",
                    hash_to_hex(&digest),
                    members.len(),
                    length
                );
                resolution
                    .groups
                    .push(DigestGroup::new(length, digest, members));
            }
        }

        self.report_progress(&progress_path);
        Ok(resolution)
    }

    /// Split `members` by `key`, keeping first-seen order of keys and members.
    ///
    /// Members whose key cannot be computed are moved into `resolution.warnings`.
    fn partition<F>(
        &self,
        members: Vec<FileRecord>,
        resolution: &mut BucketResolution,
        mut key: F,
    ) -> Result<Vec<(Hash, Vec<FileRecord>)>, ResolveError>
    where
        F: FnMut(&FileRecord) -> Result<Hash, HashError>,
    {
        let mut slots: HashMap<Hash, usize> = HashMap::new();
        let mut partitions: Vec<(Hash, Vec<FileRecord>)> = Vec::new();

        for record in members {
            if self.is_shutdown_requested() {
                return Err(ResolveError::Interrupted);
            }

            match key(&record) {
                Ok(digest) => {
                    log::trace!("{} -> {}", record.path.display(), hash_to_hex(&digest));
                    match slots.get(&digest) {
                        Some(&slot) => partitions[slot].1.push(record),
                        None => {
                            slots.insert(digest, partitions.len());
                            partitions.push((digest, vec![record]));
                        }
                    }
                }
                Err(HashError::Interrupted(_)) => return Err(ResolveError::Interrupted),
                Err(e) if e.is_resource_exhaustion() => {
                    log::error!("{}", e);
                    return Err(ResolveError::ResourceExhausted(e));
                }
                Err(e) => {
                    log::warn!("Excluding {}: {}", record.path.display(), e);
                    resolution.stats.failed_files += 1;
                    resolution.warnings.push(ScanWarning::from(e));
                }
            }
        }

        Ok(partitions)
    }

    fn report_progress(&self, path: &str) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref callback) = self.progress_callback {
            callback.on_progress(done, path);
        }
    }
}
