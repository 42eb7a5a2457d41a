//! Final duplicate report.
//!
//! [`ReportBuilder`] collects [`DigestGroup`]s from every bucket and
//! produces a [`DuplicateReport`] with a fixed total order:
//!
//! 1. wasted bytes, descending
//! 2. member count, descending
//! 3. length, ascending
//! 4. smallest member path, ascending
//!
//! Building a report performs no I/O.

use std::cmp::Ordering;
use std::path::Path;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::groups::DigestGroup;
use crate::scanner::{hash_to_hex, Hash};

/// Confirmed duplicate groups in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    groups: Vec<DigestGroup>,
}

impl DuplicateReport {
    /// Groups in report order.
    #[must_use]
    pub fn groups(&self) -> &[DigestGroup] {
        &self.groups
    }

    /// Iterate over groups in report order.
    pub fn iter(&self) -> std::slice::Iter<'_, DigestGroup> {
        self.groups.iter()
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sum of wasted bytes over all groups.
    #[must_use]
    pub fn total_wasted_bytes(&self) -> u64 {
        self.groups.iter().map(DigestGroup::wasted_bytes).sum()
    }

    /// Number of redundant copies (members beyond the first of each group).
    #[must_use]
    pub fn total_duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.len().saturating_sub(1)).sum()
    }

    /// Group whose members have the given digest.
    #[must_use]
    pub fn find_by_digest(&self, digest: &Hash) -> Option<&DigestGroup> {
        self.groups.iter().find(|g| &g.digest == digest)
    }

    /// Group that lists `path` as a member.
    #[must_use]
    pub fn group_containing(&self, path: &Path) -> Option<&DigestGroup> {
        self.groups.iter().find(|g| g.contains(path))
    }

    /// Consume the report and return its groups.
    #[must_use]
    pub fn into_groups(self) -> Vec<DigestGroup> {
        self.groups
    }
}

impl<'a> IntoIterator for &'a DuplicateReport {
    type Item = &'a DigestGroup;
    type IntoIter = std::slice::Iter<'a, DigestGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

impl Serialize for DigestGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let members: Vec<String> = self
            .members
            .iter()
            .map(|m| m.path.to_string_lossy().into_owned())
            .collect();

        let mut state = serializer.serialize_struct("DigestGroup", 4)?;
        state.serialize_field("length", &self.length)?;
        state.serialize_field("digest", &hash_to_hex(&self.digest))?;
        state.serialize_field("wasted_bytes", &self.wasted_bytes())?;
        state.serialize_field("members", &members)?;
        state.end()
    }
}

impl Serialize for DuplicateReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DuplicateReport", 3)?;
        state.serialize_field("total_wasted_bytes", &self.total_wasted_bytes())?;
        state.serialize_field("total_duplicate_files", &self.total_duplicate_files())?;
        state.serialize_field("groups", &self.groups)?;
        state.end()
    }
}

/// Accumulates digest groups and produces a sorted report.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    groups: Vec<DigestGroup>,
}

impl ReportBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one group.
    pub fn push(&mut self, group: DigestGroup) -> &mut Self {
        self.groups.push(group);
        self
    }

    /// Add many groups.
    #[must_use]
    pub fn extend(mut self, groups: impl IntoIterator<Item = DigestGroup>) -> Self {
        self.groups.extend(groups);
        self
    }

    /// Sort the groups and produce the report.
    ///
    /// Groups with fewer than two members are dropped.
    #[must_use]
    pub fn build(self) -> DuplicateReport {
        let mut groups: Vec<DigestGroup> = self
            .groups
            .into_iter()
            .filter(|g| {
                if g.len() < 2 {
                    log::debug!("Dropping group with {} member(s)", g.len());
                }
                g.len() >= 2
            })
            .collect();

        groups.sort_by(compare_groups);
        DuplicateReport { groups }
    }
}

/// Build a report from groups in one call.
#[must_use]
pub fn build_report(groups: impl IntoIterator<Item = DigestGroup>) -> DuplicateReport {
    ReportBuilder::new().extend(groups).build()
}

fn compare_groups(a: &DigestGroup, b: &DigestGroup) -> Ordering {
    b.wasted_bytes()
        .cmp(&a.wasted_bytes())
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| a.length.cmp(&b.length))
        .then_with(|| a.first_path().cmp(&b.first_path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileRecord;
    use std::path::PathBuf;

    fn group(length: u64, tag: u8, paths: &[&str]) -> DigestGroup {
        DigestGroup::new(
            length,
            [tag; 32],
            paths
                .iter()
                .map(|p| FileRecord::new(PathBuf::from(p), length))
                .collect(),
        )
    }

    #[test]
    fn test_build_orders_by_wasted_bytes() {
        let report = build_report(vec![
            group(10, 1, &["/a", "/b"]),
            group(100, 2, &["/c", "/d"]),
            group(10, 3, &["/e", "/f", "/g"]),
        ]);

        let wasted: Vec<u64> = report.iter().map(DigestGroup::wasted_bytes).collect();
        assert_eq!(wasted, vec![100, 20, 10]);
    }

    #[test]
    fn test_build_tie_breaks() {
        // Equal waste (0), more members first
        let report = build_report(vec![group(0, 1, &["/a", "/b"]), group(0, 2, &["/c", "/d", "/e"])]);
        assert_eq!(report.groups()[0].len(), 3);

        // Equal non-zero waste, more members first
        let report = build_report(vec![group(20, 1, &["/a", "/b"]), group(10, 2, &["/c", "/d", "/e"])]);
        assert_eq!(report.groups()[0].length, 10);
        assert_eq!(report.groups()[1].length, 20);

        // Everything equal but paths
        let report = build_report(vec![group(5, 1, &["/z", "/y"]), group(5, 2, &["/m", "/b"])]);
        assert_eq!(report.groups()[0].first_path(), Some(Path::new("/b")));
    }

    #[test]
    fn test_build_drops_small_groups() {
        let report = build_report(vec![group(5, 1, &["/only"]), group(5, 2, &["/a", "/b"])]);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_builder_push() {
        let mut builder = ReportBuilder::new();
        builder.push(group(1, 1, &["/a", "/b"])).push(group(2, 2, &["/c", "/d"]));
        let report = builder.build();
        assert_eq!(report.len(), 2);
        assert_eq!(report.groups()[0].length, 2);
    }

    #[test]
    fn test_totals_and_lookups() {
        let report = build_report(vec![
            group(10, 1, &["/a", "/b", "/c"]),
            group(4, 2, &["/d", "/e"]),
        ]);

        assert_eq!(report.total_wasted_bytes(), 24);
        assert_eq!(report.total_duplicate_files(), 3);
        assert_eq!(report.find_by_digest(&[2u8; 32]).map(|g| g.length), Some(4));
        assert!(report.find_by_digest(&[9u8; 32]).is_none());
        assert_eq!(
            report.group_containing(Path::new("/b")).map(|g| g.length),
            Some(10)
        );
        assert!(report.group_containing(Path::new("/zz")).is_none());
    }

    #[test]
    fn test_empty_report() {
        let report = build_report(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.total_wasted_bytes(), 0);
        assert_eq!((&report).into_iter().count(), 0);
    }

    #[test]
    fn test_serialize_json_shape() {
        let report = build_report(vec![group(3, 0xab, &["/x", "/y"])]);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["total_wasted_bytes"], 3);
        let g = &value["groups"][0];
        assert_eq!(g["length"], 3);
        assert_eq!(g["wasted_bytes"], 3);
        assert_eq!(g["digest"], "ab".repeat(32));
        assert_eq!(g["members"][0], "/x");
    }
}
