//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one or more
//! directory trees and producing a [`FileRecord`] for every regular file.
//! It uses [`jwalk`] to read directories in parallel while still yielding
//! entries in a sorted, reproducible order.
//!
//! # Features
//!
//! - Multiple roots, with duplicate and nested roots collapsed
//! - Symlinks skipped by default, followed with loop detection on request
//! - Minimum size filtering
//! - Optional hardlink pre-filter via [`HardlinkTracker`]
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use duplicates::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from("/home/user/Downloads")], WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.length),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};

use super::hardlink::HardlinkTracker;
use super::{FileRecord, ScanError, WalkerConfig};

/// Counters for entries the walker filtered out without reporting an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Files smaller than the configured minimum size
    pub skipped_small: u64,
    /// Symlinks skipped because link following is off
    pub skipped_symlinks: u64,
    /// Additional paths to an already-reported inode
    pub skipped_hardlinks: u64,
}

/// Directory walker for parallel file discovery.
#[derive(Debug)]
pub struct Walker {
    roots: Vec<PathBuf>,
    config: WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
    skipped_small: AtomicU64,
    skipped_symlinks: AtomicU64,
    skipped_hardlinks: AtomicU64,
}

impl Walker {
    /// Create a walker over the given roots.
    ///
    /// Roots are canonicalized where possible. A root equal to or nested
    /// inside an earlier root is dropped so no file is listed twice.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self {
            roots: normalize_roots(roots),
            config,
            shutdown_flag: None,
            skipped_small: AtomicU64::new(0),
            skipped_symlinks: AtomicU64::new(0),
            skipped_hardlinks: AtomicU64::new(0),
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops iteration
    /// before the next entry.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Roots that will actually be traversed, after normalization.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Snapshot of the filter counters.
    #[must_use]
    pub fn stats(&self) -> WalkStats {
        WalkStats {
            skipped_small: self.skipped_small.load(Ordering::Relaxed),
            skipped_symlinks: self.skipped_symlinks.load(Ordering::Relaxed),
            skipped_hardlinks: self.skipped_hardlinks.load(Ordering::Relaxed),
        }
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk every root in order, yielding file records.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Within a root, children are visited in file-name order.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let mut hardlink_tracker = HardlinkTracker::new();

        self.roots
            .iter()
            .flat_map(move |root| {
                self.walk_dir(root)
                    .into_iter()
                    .map(move |entry| (root.as_path(), entry))
            })
            .take_while(move |_| {
                let stop = self.is_shutdown_requested();
                if stop {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                }
                !stop
            })
            .filter_map(move |(root, entry_result)| match entry_result {
                Ok(mut entry) => {
                    let path = entry.path();
                    let file_type = entry.file_type();

                    // Directories are traversed, not reported. jwalk attaches a
                    // failed read_dir to the directory entry instead of yielding it.
                    if file_type.is_dir() {
                        return entry
                            .read_children_error
                            .take()
                            .map(|e| Err(convert_jwalk_error(&path, e)));
                    }

                    let is_symlink = file_type.is_symlink() || entry.path_is_symlink();
                    if is_symlink && !self.config.follow_symlinks {
                        log::trace!("Skipping symlink: {}", path.display());
                        self.skipped_symlinks.fetch_add(1, Ordering::Relaxed);
                        return None;
                    }

                    self.process_file(path, &mut hardlink_tracker)
                }
                Err(e) => Some(Err(convert_jwalk_error(root, e))),
            })
    }

    fn walk_dir(&self, root: &Path) -> WalkDir {
        WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(false)
            .sort(true)
            .parallelism(Parallelism::RayonNewPool(self.config.worker_count))
    }

    /// Stat a candidate path and turn it into a record if it qualifies.
    fn process_file(
        &self,
        path: PathBuf,
        hardlink_tracker: &mut HardlinkTracker,
    ) -> Option<Result<FileRecord, ScanError>> {
        let metadata = if self.config.follow_symlinks {
            std::fs::metadata(&path)
        } else {
            std::fs::symlink_metadata(&path)
        };

        let metadata = match metadata {
            Ok(m) => m,
            Err(e) => {
                let err = ScanError::from_io(&path, e);
                log::warn!("{}", err);
                return Some(Err(err));
            }
        };

        // Sockets, fifos and devices are not content
        if !metadata.is_file() {
            return None;
        }

        let length = metadata.len();
        if length < self.config.min_size {
            log::trace!(
                "Skipping file below minimum size ({} bytes): {}",
                length,
                path.display()
            );
            self.skipped_small.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        if self.config.skip_hardlinks && hardlink_tracker.is_hardlink(&metadata) {
            log::debug!("Skipping hardlink: {}", path.display());
            self.skipped_hardlinks.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        Some(Ok(FileRecord::new(path, length)))
    }
}

/// Canonicalize roots and drop duplicates and roots nested in another root.
fn normalize_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::with_capacity(roots.len());

    for root in roots {
        let root = root.canonicalize().unwrap_or(root);
        if kept.iter().any(|k| root.starts_with(k)) {
            log::debug!("Root {} is already covered, skipping", root.display());
            continue;
        }
        kept.retain(|k| {
            let nested = k.starts_with(&root);
            if nested {
                log::debug!("Root {} is nested in {}, skipping", k.display(), root.display());
            }
            !nested
        });
        kept.push(root);
    }

    kept
}

/// Map a jwalk error to a [`ScanError`], blaming `fallback` when the error
/// carries no path of its own.
fn convert_jwalk_error(fallback: &Path, error: jwalk::Error) -> ScanError {
    let path = error
        .path()
        .map_or_else(|| fallback.to_path_buf(), Path::to_path_buf);

    if error.loop_ancestor().is_some() {
        log::warn!("Symlink loop detected at {}", path.display());
        return ScanError::Loop(path);
    }

    let message = error.to_string();
    let err = match error.into_io_error() {
        Some(io_error) => ScanError::from_io(&path, io_error),
        None => ScanError::Io {
            path,
            source: io::Error::other(message),
        },
    };
    log::warn!("Walker error: {}", err);
    err
}
