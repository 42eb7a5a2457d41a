//! Content-based duplicate file finder.
//!
//! Walks one or more directory trees and groups files whose bytes are
//! identical. Files are bucketed by length first; only buckets with two or
//! more members are hashed (BLAKE3), optionally after a cheap partial-hash
//! pre-check. Nothing on disk is modified.
//!
//! ```no_run
//! use duplicates::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let (report, summary) = finder
//!     .find_duplicates(&[PathBuf::from("/data/a"), PathBuf::from("/data/b")])
//!     .unwrap();
//!
//! for group in &report {
//!     println!("{} copies of {} bytes", group.len(), group.length);
//! }
//! println!("{} reclaimable", summary.reclaimable_display());
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

pub use app::run_app;
