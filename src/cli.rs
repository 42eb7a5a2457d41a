//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Compare two directories
//! duplicates ~/Photos /mnt/backup/Photos
//!
//! # JSON for scripting, ignore files under 1 MiB
//! duplicates ~/Downloads --min-size 1MiB --output json
//!
//! # Debug logging
//! duplicates -v ~/Downloads
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use bytesize::ByteSize;
use clap::{Parser, ValueEnum};

use crate::config::Settings;

/// Find files with identical content under one or more directories.
///
/// Files are grouped by size, then by a BLAKE3 hash of their content. Nothing
/// is modified: the result is a report of duplicate groups.
#[derive(Debug, Parser)]
#[command(name = "duplicates")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to scan
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Ignore files smaller than this (e.g. 4096, 10KB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Follow symbolic links
    #[arg(long)]
    pub follow_symlinks: bool,

    /// List only one path per hard-linked inode
    #[arg(long)]
    pub skip_hardlinks: bool,

    /// Number of worker threads (default: available parallelism)
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..=256))]
    pub workers: Option<u16>,

    /// Hash whole files without the partial-hash pre-check
    #[arg(long)]
    pub no_prehash: bool,

    /// Read settings from this TOML file
    #[arg(long, value_name = "FILE", env = "DUPLICATES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Do not draw progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// Overlay flags given on the command line onto loaded settings.
    ///
    /// Flags that were not given leave the setting untouched.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(min_size) = self.min_size {
            settings.min_file_size = min_size;
        }
        if self.follow_symlinks {
            settings.follow_symlinks = true;
        }
        if self.skip_hardlinks {
            settings.skip_hardlinks = true;
        }
        if let Some(workers) = self.workers {
            settings.worker_count = Some(usize::from(workers));
        }
        if self.no_prehash {
            settings.prehash = false;
        }
    }

    /// Whether progress bars should be drawn.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !(self.quiet || self.no_progress || self.output == OutputFormat::Json)
    }
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// Single JSON document on stdout
    Json,
}

/// Parse a human-readable size such as `1024`, `10KB` or `1.5 MiB`.
///
/// Decimal suffixes (KB, MB, ...) are powers of 1000, binary suffixes
/// (KiB, MiB, ...) powers of 1024.
///
/// # Errors
///
/// Returns a message describing the malformed input.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }
    ByteSize::from_str(s)
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{s}': {e}"))
}
