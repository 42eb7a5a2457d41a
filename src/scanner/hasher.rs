//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing BLAKE3 hashes
//! of file contents. Files are read through a fixed-size buffer, so peak
//! memory per call is the buffer size regardless of file size.
//!
//! # Example
//!
//! ```no_run
//! use duplicates::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.full_hash(Path::new("Cargo.toml")).unwrap();
//! println!("{}", hash_to_hex(&digest));
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// BLAKE3 digest (32 bytes).
pub type Hash = [u8; 32];

/// Number of leading bytes read by [`Hasher::prehash`].
pub const PREHASH_SIZE: u64 = 4096;

/// Default read buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming BLAKE3 hasher.
///
/// Cheap to share: wrap in an [`Arc`] and hand it to worker threads.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Set the read buffer size (minimum 512 bytes).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(512);
        self
    }

    /// Set the shutdown flag; reads stop between chunks once it is raised.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Current read buffer size.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Digest of zero bytes. No I/O is performed.
    #[must_use]
    pub fn empty_digest() -> Hash {
        *blake3::Hasher::new().finalize().as_bytes()
    }

    /// Hash the first [`PREHASH_SIZE`] bytes of a file.
    ///
    /// For files no longer than [`PREHASH_SIZE`] this equals [`Hasher::full_hash`].
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn prehash(&self, path: &Path) -> Result<Hash, HashError> {
        self.partial_hash(path, PREHASH_SIZE)
    }

    /// Hash at most `limit` leading bytes of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn partial_hash(&self, path: &Path, limit: u64) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let (digest, _) = self.stream(path, file.take(limit))?;
        Ok(digest)
    }

    /// Hash the entire content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let (digest, _) = self.stream(path, file)?;
        Ok(digest)
    }

    /// Hash the entire content of a file whose length is already known.
    ///
    /// Fails with [`HashError::SizeChanged`] when the number of bytes read
    /// differs from `expected`, which means the file was truncated or
    /// appended to after it was listed.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read or its length changed.
    pub fn full_hash_expecting(&self, path: &Path, expected: u64) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let (digest, actual) = self.stream(path, file)?;
        if actual != expected {
            return Err(HashError::SizeChanged {
                path: path.to_path_buf(),
                expected,
                actual,
            });
        }
        Ok(digest)
    }

    /// Feed a reader through BLAKE3, returning the digest and bytes read.
    fn stream<R: Read>(&self, path: &Path, mut reader: R) -> Result<(Hash, u64), HashError> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total = 0u64;

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..n]);
            total += n as u64;
        }

        log::trace!("Hashed {} bytes of {}", total, path.display());
        Ok((*hasher.finalize().as_bytes(), total))
    }
}

/// Convert a hash to a lowercase hexadecimal string.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}

/// Parse a 64-character hexadecimal string into a hash.
///
/// Returns `None` for malformed input.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    blake3::Hash::from_hex(hex).ok().map(|h| *h.as_bytes())
}
