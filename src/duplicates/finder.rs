//! Duplicate finder: the end-to-end detection pipeline.
//!
//! # Overview
//!
//! [`DuplicateFinder`] wires the stages together:
//!
//! 1. **Walk** - the [`Walker`] lists regular files under every root
//! 2. **Index** - indexer threads drain a bounded channel into a sharded
//!    [`SizeIndex`]; the channel bound keeps memory flat when traversal
//!    outruns indexing
//! 3. **Resolve** - candidate buckets are hashed on a rayon pool of
//!    `worker_count` threads by the [`CandidateResolver`]
//! 4. **Report** - groups are sorted into a [`DuplicateReport`]
//!
//! Per-file failures never abort a scan. They are collected as
//! [`ScanWarning`]s in the [`ScanSummary`].
//!
//! # Example
//!
//! ```no_run
//! use duplicates::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_worker_count(4));
//! let (report, summary) = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//!
//! println!("Found {} duplicate groups", report.len());
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use serde::Serialize;

use super::groups::{group_by_size, GroupingStats, SizeBucket};
use super::index::SizeIndex;
use super::prefilter::{PartialHashPrefilter, Prefilter};
use super::report::{build_report, DuplicateReport};
use super::resolver::{CandidateResolver, ResolveError};
use crate::progress::{ProgressCallback, PHASE_WALKING};
use crate::scanner::{
    default_worker_count, FileRecord, Hash, HashError, Hasher, ScanWarning, Walker, WalkerConfig,
    MAX_WORKERS,
};

/// Default capacity of the queue between the walker and the indexers.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Threads used for directory reading, indexing and hashing.
    pub worker_count: usize,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Files shorter than this are never reported.
    pub min_file_size: u64,
    /// Report only the first path seen for each inode.
    pub skip_hardlinks: bool,
    /// Pre-check strategy run before full hashing, if any.
    pub prefilter: Option<Arc<dyn Prefilter>>,
    /// Capacity of the walker → indexer queue.
    pub queue_capacity: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("worker_count", &self.worker_count)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("min_file_size", &self.min_file_size)
            .field("skip_hardlinks", &self.skip_hardlinks)
            .field("prefilter", &self.prefilter)
            .field("queue_capacity", &self.queue_capacity)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            follow_symlinks: false,
            min_file_size: 0,
            skip_hardlinks: false,
            prefilter: Some(Arc::new(PartialHashPrefilter::default())),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the worker thread count, clamped to `1..=MAX_WORKERS`.
    #[must_use]
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers.clamp(1, MAX_WORKERS);
        self
    }

    /// Set symlink following.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_file_size(mut self, bytes: u64) -> Self {
        self.min_file_size = bytes;
        self
    }

    /// Enable or disable the hardlink pre-filter.
    #[must_use]
    pub fn with_skip_hardlinks(mut self, skip: bool) -> Self {
        self.skip_hardlinks = skip;
        self
    }

    /// Replace the pre-check strategy.
    #[must_use]
    pub fn with_prefilter(mut self, prefilter: Arc<dyn Prefilter>) -> Self {
        self.prefilter = Some(prefilter);
        self
    }

    /// Disable the pre-check.
    #[must_use]
    pub fn without_prefilter(mut self) -> Self {
        self.prefilter = None;
        self
    }

    /// Set the walker → indexer queue capacity (at least 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
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

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_follow_symlinks(self.follow_symlinks)
            .with_min_size(self.min_file_size)
            .with_skip_hardlinks(self.skip_hardlinks)
            .with_worker_count(self.worker_count)
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Regular files that passed traversal filters
    pub files_discovered: usize,
    /// Sum of their lengths
    pub bytes_discovered: u64,
    /// Files skipped for being below the minimum size
    pub skipped_small: u64,
    /// Symlinks skipped because link following is off
    pub skipped_symlinks: u64,
    /// Extra paths to an already-listed inode
    pub skipped_hardlinks: u64,
    /// Files dropped because no other file shares their length
    pub eliminated_by_size: usize,
    /// Files dropped by the pre-check
    pub eliminated_by_prefilter: usize,
    /// Files hashed in full
    pub files_hashed: usize,
    /// Bytes read by full hashing
    pub bytes_hashed: u64,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies (members beyond the first of each group)
    pub duplicate_files: usize,
    /// Space reclaimable by keeping one copy per group
    pub reclaimable_bytes: u64,
    /// Wall-clock duration of the scan
    pub scan_duration: Duration,
    /// Non-fatal problems, sorted by path
    pub warnings: Vec<ScanWarning>,
}

impl ScanSummary {
    /// Whether any file was skipped or excluded because of an error.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Percentage of discovered bytes that are redundant copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.bytes_discovered == 0 {
            0.0
        } else {
            (self.reclaimable_bytes as f64 / self.bytes_discovered as f64) * 100.0
        }
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_bytes).to_string()
    }

    /// Discovered bytes as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize(self.bytes_discovered).to_string()
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// No root directories were given.
    #[error("No directories to scan")]
    NoRoots,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The process ran out of file descriptors.
    #[error("Too many open files while reading {0}")]
    ResourceExhausted(PathBuf),

    /// The hashing thread pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl FinderError {
    /// Whether the error is caused by invalid input rather than the scan itself.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::NoRoots | Self::PathNotFound(_) | Self::NotADirectory(_)
        )
    }
}

impl From<ResolveError> for FinderError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Interrupted => Self::Interrupted,
            ResolveError::ResourceExhausted(e) => Self::ResourceExhausted(e.path().to_path_buf()),
        }
    }
}

/// Duplicate finder that orchestrates the detection pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl std::fmt::Debug for DuplicateFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateFinder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Digest of a single file's full content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read.
    pub fn hash_file(&self, path: &Path) -> Result<Hash, HashError> {
        self.hasher.full_hash(path)
    }

    /// Find all duplicate files under the given roots.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - `roots` is empty, or a root is missing or not a directory
    /// - shutdown is requested
    /// - the process runs out of file descriptors
    /// - the hashing pool cannot be created
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
    ) -> Result<(DuplicateReport, ScanSummary), FinderError> {
        let start_time = Instant::now();
        validate_roots(roots)?;

        log::info!("Starting duplicate scan of {} root(s)", roots.len());
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut walker = Walker::new(roots.to_vec(), self.config.walker_config());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
        }
        let (index, mut warnings) = self.index_files(&walker)?;
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }

        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted during traversal");
            return Err(FinderError::Interrupted);
        }

        let walk_stats = walker.stats();
        let (buckets, grouping) = index.into_candidates();
        log::info!(
            "Found {} files ({}), {} candidate buckets",
            grouping.total_files,
            ByteSize(grouping.total_size),
            buckets.len()
        );

        let mut summary = ScanSummary {
            skipped_small: walk_stats.skipped_small,
            skipped_symlinks: walk_stats.skipped_symlinks,
            skipped_hardlinks: walk_stats.skipped_hardlinks,
            ..Default::default()
        };
        let report = self.resolve(buckets, &grouping, &mut summary, &mut warnings)?;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete in {:.2?}: {} duplicate groups, {} reclaimable, {} warning(s)",
            summary.scan_duration,
            summary.duplicate_groups,
            summary.reclaimable_display(),
            summary.warnings.len()
        );

        Ok((report, summary))
    }

    /// Find duplicates among an already collected list of files.
    ///
    /// Traversal is skipped; files are indexed, resolved and reported as in
    /// [`find_duplicates`](Self::find_duplicates). Files that changed or
    /// vanished since they were listed become warnings.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` on shutdown, descriptor exhaustion or pool failure.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileRecord>,
    ) -> Result<(DuplicateReport, ScanSummary), FinderError> {
        let start_time = Instant::now();
        log::info!("Starting duplicate scan of {} listed files", files.len());

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let (buckets, grouping) = group_by_size(files);
        let mut summary = ScanSummary::default();
        let mut warnings = Vec::new();
        let report = self.resolve(buckets, &grouping, &mut summary, &mut warnings)?;
        summary.scan_duration = start_time.elapsed();

        Ok((report, summary))
    }

    /// Stream walker output through a bounded queue into a sharded index.
    fn index_files(&self, walker: &Walker) -> Result<(SizeIndex, Vec<ScanWarning>), FinderError> {
        let index = SizeIndex::default();
        let discovered = AtomicUsize::new(0);
        let mut warnings = Vec::new();
        let mut fatal = None;
        let workers = self.config.worker_count.max(1);

        std::thread::scope(|scope| {
            let (tx, rx) = crossbeam_channel::bounded::<FileRecord>(self.config.queue_capacity);

            for _ in 0..workers {
                let rx = rx.clone();
                let index = &index;
                let discovered = &discovered;
                scope.spawn(move || {
                    for record in rx {
                        if self.config.is_shutdown_requested() {
                            log::debug!("Indexer: Shutdown requested, stopping");
                            break;
                        }
                        let count = discovered.fetch_add(1, Ordering::Relaxed) + 1;
                        if let Some(ref callback) = self.config.progress_callback {
                            callback.on_progress(count, &record.path.to_string_lossy());
                        }
                        index.insert(record);
                    }
                });
            }
            // Indexers hold the only receivers, so a send fails once they all stop
            drop(rx);

            for result in walker.walk() {
                match result {
                    Ok(record) => {
                        log::trace!("Discovered {} ({} bytes)", record.path.display(), record.length);
                        if tx.send(record).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.is_resource_exhaustion() => {
                        log::error!("{}", e);
                        fatal = Some(FinderError::ResourceExhausted(e.path().to_path_buf()));
                        break;
                    }
                    Err(e) => warnings.push(ScanWarning::from(e)),
                }
            }
            drop(tx);
        });

        match fatal {
            Some(err) => Err(err),
            None => Ok((index, warnings)),
        }
    }

    /// Resolve candidate buckets and fill in the summary.
    fn resolve(
        &self,
        buckets: Vec<SizeBucket>,
        grouping: &GroupingStats,
        summary: &mut ScanSummary,
        warnings: &mut Vec<ScanWarning>,
    ) -> Result<DuplicateReport, FinderError> {
        summary.files_discovered = grouping.total_files;
        summary.bytes_discovered = grouping.total_size;
        summary.eliminated_by_size = grouping.eliminated_unique;

        let report = if buckets.is_empty() {
            log::info!("No potential duplicates found after size grouping");
            DuplicateReport::default()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.worker_count.max(1))
                .thread_name(|i| format!("duplicates-hash-{}", i))
                .build()?;

            let mut resolver = CandidateResolver::new(Arc::clone(&self.hasher));
            resolver = match self.config.prefilter {
                Some(ref prefilter) => resolver.with_prefilter(Arc::clone(prefilter)),
                None => resolver.without_prefilter(),
            };
            if let Some(ref flag) = self.config.shutdown_flag {
                resolver = resolver.with_shutdown_flag(Arc::clone(flag));
            }
            if let Some(ref callback) = self.config.progress_callback {
                resolver = resolver.with_progress_callback(Arc::clone(callback));
            }

            let resolution = resolver.resolve_all(buckets, &pool)?;
            summary.eliminated_by_prefilter = resolution.stats.eliminated_by_prefilter;
            summary.files_hashed = resolution.stats.files_hashed;
            summary.bytes_hashed = resolution.stats.bytes_hashed;
            warnings.extend(resolution.warnings);
            build_report(resolution.groups)
        };

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        warnings.sort_by(|a, b| a.path.cmp(&b.path).then(a.kind.cmp(&b.kind)));
        summary.warnings = std::mem::take(warnings);
        summary.duplicate_groups = report.len();
        summary.duplicate_files = report.total_duplicate_files();
        summary.reclaimable_bytes = report.total_wasted_bytes();

        Ok(report)
    }
}

fn validate_roots(roots: &[PathBuf]) -> Result<(), FinderError> {
    if roots.is_empty() {
        return Err(FinderError::NoRoots);
    }
    for root in roots {
        if !root.exists() {
            return Err(FinderError::PathNotFound(root.clone()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.clone()));
        }
    }
    Ok(())
}
