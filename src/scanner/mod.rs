//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Parallel directory walking over one or more roots using jwalk
//! - Streaming content hashing with BLAKE3
//! - Optional hardlink detection
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//! - [`hardlink`]: Inode tracking for the opt-in hardlink pre-filter
//!
//! # Example
//!
//! ```no_run
//! use duplicates::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     min_size: 1024, // Skip files under 1KB
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.length),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hardlink;
pub mod hasher;
pub mod walker;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

// Re-export main types
pub use hasher::{hash_to_hex, hex_to_hash, Hash, Hasher, DEFAULT_BUFFER_SIZE, PREHASH_SIZE};
pub use walker::{WalkStats, Walker};

/// A regular file discovered during traversal.
///
/// The digest is filled in by the candidate resolver, and only for files
/// that share their length with at least one other file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes as seen during traversal
    pub length: u64,
    digest: Option<Hash>,
}

impl FileRecord {
    /// Create a record without a digest.
    #[must_use]
    pub fn new(path: PathBuf, length: u64) -> Self {
        Self {
            path,
            length,
            digest: None,
        }
    }

    /// Content digest, if the file has been hashed.
    #[must_use]
    pub fn digest(&self) -> Option<&Hash> {
        self.digest.as_ref()
    }

    /// Consume the record and return it with its digest set.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if a different digest was already set.
    #[must_use]
    pub fn with_digest(mut self, digest: Hash) -> Self {
        debug_assert!(
            self.digest.map_or(true, |d| d == digest),
            "digest of {} is already set",
            self.path.display()
        );
        self.digest = Some(digest);
        self
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Off by default: links are skipped, which rules out cycles and double counting.
    pub follow_symlinks: bool,

    /// Minimum file size to include (in bytes).
    /// Files smaller than this are skipped entirely.
    pub min_size: u64,

    /// Report only the first path seen for each inode.
    pub skip_hardlinks: bool,

    /// Number of threads jwalk uses to read directories.
    pub worker_count: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            min_size: 0,
            skip_hardlinks: false,
            worker_count: default_worker_count(),
        }
    }
}

impl WalkerConfig {
    /// Set symlink following.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Enable or disable the hardlink pre-filter.
    #[must_use]
    pub fn with_skip_hardlinks(mut self, skip: bool) -> Self {
        self.skip_hardlinks = skip;
        self
    }

    /// Set the directory reader thread count.
    #[must_use]
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers.max(1);
        self
    }
}

/// Upper bound on worker threads, keeps open descriptors well under common limits.
pub const MAX_WORKERS: usize = 256;

/// Default worker count: the available parallelism, clamped to [`MAX_WORKERS`].
#[must_use]
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map_or(4, std::num::NonZeroUsize::get)
        .clamp(1, MAX_WORKERS)
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path vanished between listing and inspection.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Symlink loop detected while following links.
    #[error("Symlink loop at {0}")]
    Loop(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Loop(p) => p,
            Self::Io { path, .. } => path,
        }
    }

    /// Whether this error means the process ran out of file descriptors.
    #[must_use]
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Self::Io { source, .. } if is_descriptor_exhaustion(source))
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file was removed after traversal.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file changed length between traversal and hashing.
    #[error("File changed while hashing {path}: expected {expected} bytes, read {actual}")]
    SizeChanged {
        /// Path of the modified file
        path: PathBuf,
        /// Length recorded during traversal
        expected: u64,
        /// Bytes actually read
        actual: u64,
    },

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => p,
            Self::SizeChanged { path, .. } | Self::Io { path, .. } => path,
        }
    }

    /// Whether this error means the process ran out of file descriptors.
    #[must_use]
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Self::Io { source, .. } if is_descriptor_exhaustion(source))
    }
}

/// EMFILE / ENFILE on Unix.
#[cfg(unix)]
fn is_descriptor_exhaustion(error: &io::Error) -> bool {
    const ENFILE: i32 = 23;
    const EMFILE: i32 = 24;
    matches!(error.raw_os_error(), Some(ENFILE | EMFILE))
}

/// ERROR_TOO_MANY_OPEN_FILES on Windows.
#[cfg(windows)]
fn is_descriptor_exhaustion(error: &io::Error) -> bool {
    error.raw_os_error() == Some(4)
}

#[cfg(not(any(unix, windows)))]
fn is_descriptor_exhaustion(_error: &io::Error) -> bool {
    false
}

/// Coarse category of a non-fatal warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Permission denied
    Access,
    /// Path disappeared during the scan
    Vanished,
    /// Reading file content failed or raced with a modification
    Hash,
    /// Other traversal failure
    Walk,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Access => "access",
            Self::Vanished => "vanished",
            Self::Hash => "hash",
            Self::Walk => "walk",
        };
        f.write_str(name)
    }
}

/// A non-fatal problem reported alongside the duplicate report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    /// Path that was skipped or excluded
    pub path: PathBuf,
    /// Category of the failure
    pub kind: WarningKind,
    /// Human-readable reason
    pub reason: String,
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.reason)
    }
}

impl From<ScanError> for ScanWarning {
    fn from(err: ScanError) -> Self {
        let kind = match err {
            ScanError::PermissionDenied(_) => WarningKind::Access,
            ScanError::NotFound(_) => WarningKind::Vanished,
            ScanError::Loop(_) | ScanError::Io { .. } => WarningKind::Walk,
        };
        Self {
            path: err.path().to_path_buf(),
            kind,
            reason: err.to_string(),
        }
    }
}

impl From<HashError> for ScanWarning {
    fn from(err: HashError) -> Self {
        let kind = match err {
            HashError::PermissionDenied(_) => WarningKind::Access,
            HashError::NotFound(_) => WarningKind::Vanished,
            _ => WarningKind::Hash,
        };
        Self {
            path: err.path().to_path_buf(),
            kind,
            reason: err.to_string(),
        }
    }
}
