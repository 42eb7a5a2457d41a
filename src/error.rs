//! Exit codes and machine-readable error output for the binary.

use serde::Serialize;

use crate::duplicates::{DuplicateReport, FinderError, ScanSummary};

/// Process exit codes.
///
/// - 0: duplicates found
/// - 1: fatal error
/// - 2: scan completed, no duplicates
/// - 3: scan completed, some files skipped with warnings
/// - 130: interrupted (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed and duplicates were found.
    Success = 0,
    /// A fatal error stopped the scan.
    GeneralError = 1,
    /// Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Scan completed but some files could not be examined.
    PartialSuccess = 3,
    /// Scan was interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric exit status.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DUP000",
            Self::GeneralError => "DUP001",
            Self::NoDuplicates => "DUP002",
            Self::PartialSuccess => "DUP003",
            Self::Interrupted => "DUP130",
        }
    }

    /// Exit code for a completed scan. Warnings take precedence over the
    /// duplicates/no-duplicates distinction.
    #[must_use]
    pub fn for_outcome(report: &DuplicateReport, summary: &ScanSummary) -> Self {
        if summary.has_warnings() {
            Self::PartialSuccess
        } else if report.is_empty() {
            Self::NoDuplicates
        } else {
            Self::Success
        }
    }

    /// Exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Machine-readable code, e.g. "DUP001"
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Describe an error and the exit code it maps to.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
