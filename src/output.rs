//! Rendering of scan results for the command-line wrapper.
//!
//! Renderers write to any [`Write`] so they can be tested against a buffer.

use std::io::{self, Write};

use bytesize::ByteSize;
use serde::Serialize;

use crate::duplicates::{DuplicateReport, ScanSummary};
use crate::scanner::hash_to_hex;

/// Write a human-readable listing of every group, then totals and warnings.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_text<W: Write>(
    out: &mut W,
    report: &DuplicateReport,
    summary: &ScanSummary,
) -> io::Result<()> {
    for (i, group) in report.iter().enumerate() {
        writeln!(
            out,
            "Group {}: {} files, {} each, {} wasted",
            i + 1,
            group.len(),
            ByteSize(group.length),
            ByteSize(group.wasted_bytes())
        )?;
        writeln!(out, "  blake3 {}", hash_to_hex(&group.digest))?;
        for member in &group.members {
            writeln!(out, "  {}", member.path.display())?;
        }
        writeln!(out)?;
    }

    if report.is_empty() {
        writeln!(out, "No duplicates found.")?;
    }

    writeln!(
        out,
        "Scanned {} files ({}) in {:.2?}",
        summary.files_discovered,
        summary.total_size_display(),
        summary.scan_duration
    )?;
    writeln!(
        out,
        "{} duplicate groups, {} redundant files, {} reclaimable ({:.1}%)",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display(),
        summary.wasted_percentage()
    )?;

    if summary.has_warnings() {
        writeln!(out, "\n{} file(s) skipped:", summary.warnings.len())?;
        for warning in &summary.warnings {
            writeln!(out, "  {}", warning)?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a DuplicateReport,
    summary: &'a ScanSummary,
}

/// Write the report and summary as one pretty-printed JSON document.
///
/// # Errors
///
/// Returns any error from serialization or the underlying writer.
pub fn write_json<W: Write>(
    out: &mut W,
    report: &DuplicateReport,
    summary: &ScanSummary,
) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &JsonOutput { report, summary })?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::{build_report, DigestGroup};
    use crate::scanner::{FileRecord, ScanWarning, WarningKind};
    use std::path::PathBuf;

    fn sample() -> (DuplicateReport, ScanSummary) {
        let report = build_report(vec![DigestGroup::new(
            5,
            *blake3::hash(b"hello").as_bytes(),
            vec![
                FileRecord::new(PathBuf::from("/r/a.txt"), 5),
                FileRecord::new(PathBuf::from("/r/b.txt"), 5),
            ],
        )]);
        let summary = ScanSummary {
            files_discovered: 3,
            bytes_discovered: 15,
            duplicate_groups: 1,
            duplicate_files: 1,
            reclaimable_bytes: 5,
            warnings: vec![ScanWarning {
                path: PathBuf::from("/r/locked"),
                kind: WarningKind::Access,
                reason: "Permission denied: /r/locked".to_string(),
            }],
            ..Default::default()
        };
        (report, summary)
    }

    #[test]
    fn test_text_lists_groups_and_warnings() {
        let (report, summary) = sample();
        let mut buf = Vec::new();
        write_text(&mut buf, &report, &summary).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Group 1: 2 files"));
        assert!(text.contains("  /r/a.txt"));
        assert!(text.contains("  /r/b.txt"));
        assert!(text.contains("1 file(s) skipped"));
        assert!(text.contains("[access] Permission denied: /r/locked"));
    }

    #[test]
    fn test_text_no_duplicates() {
        let mut buf = Vec::new();
        write_text(&mut buf, &DuplicateReport::default(), &ScanSummary::default()).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("No duplicates found."));
    }

    #[test]
    fn test_json_document() {
        let (report, summary) = sample();
        let mut buf = Vec::new();
        write_json(&mut buf, &report, &summary).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["report"]["groups"][0]["length"], 5);
        assert_eq!(value["report"]["groups"][0]["members"][1], "/r/b.txt");
        assert_eq!(value["summary"]["files_discovered"], 3);
        assert_eq!(value["summary"]["warnings"][0]["kind"], "access");
    }
}
