//! Inode tracking for the opt-in hardlink pre-filter.
//!
//! # Overview
//!
//! Hardlinks are several directory entries for one inode. Their content is
//! identical by construction, so by default the walker reports every path and
//! they end up in the same duplicate group after hashing. With
//! [`WalkerConfig::skip_hardlinks`](super::WalkerConfig::skip_hardlinks) the
//! walker consults a [`HardlinkTracker`] and reports only the first path seen
//! for each inode, which saves hashing work when a tree is already linked.
//!
//! # Platform Support
//!
//! - **Unix**: Uses (device_id, inode) pairs from file metadata
//! - **Other**: Detection disabled (every path is treated as distinct).
//!   Stable std exposes no file index outside unix, and reading one on
//!   Windows needs an open handle per file.

use std::collections::HashSet;
use std::fs::Metadata;

/// Remembers seen inodes and flags repeat visits.
///
/// Not thread-safe; the walker owns one tracker per walk.
#[derive(Debug, Default)]
pub struct HardlinkTracker {
    seen: HashSet<InodeKey>,
}

impl HardlinkTracker {
    /// Create an empty tracker.
    ///
    /// # Example
    ///
    /// ```
    /// use duplicates::scanner::hardlink::HardlinkTracker;
    ///
    /// let tracker = HardlinkTracker::new();
    /// assert_eq!(tracker.seen_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this inode was already seen, recording it otherwise.
    ///
    /// Always `false` on platforms without inode information.
    pub fn is_hardlink(&mut self, metadata: &Metadata) -> bool {
        match InodeKey::from_metadata(metadata) {
            Some(key) => !self.seen.insert(key),
            None => false,
        }
    }

    /// Number of distinct inodes recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Whether hardlink detection works on this platform.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(not(unix), allow(dead_code))]
struct InodeKey {
    dev: u64,
    ino: u64,
}

impl InodeKey {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}
