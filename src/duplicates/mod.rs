//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size indexing and candidate buckets ([`index`], [`groups`])
//! - Cheap pre-checks before full hashing ([`prefilter`])
//! - Per-bucket content resolution ([`resolver`])
//! - Ordered reporting ([`report`])
//! - The end-to-end pipeline ([`finder`])

pub mod finder;
pub mod groups;
pub mod index;
pub mod prefilter;
pub mod report;
pub mod resolver;

pub use finder::{
    DuplicateFinder, FinderConfig, FinderError, ScanSummary, DEFAULT_QUEUE_CAPACITY,
};
pub use groups::{group_by_size, DigestGroup, GroupingStats, SizeBucket};
pub use index::SizeIndex;
pub use prefilter::{PartialHashPrefilter, Prefilter};
pub use report::{build_report, DuplicateReport, ReportBuilder};
pub use resolver::{BucketResolution, CandidateResolver, ResolveError, ResolverStats};
