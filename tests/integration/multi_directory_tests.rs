use duplicates::duplicates::{DuplicateFinder, FinderConfig};
use std::fs;
use tempfile::tempdir;

fn finder() -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_worker_count(2))
}

#[test]
fn test_scan_two_non_overlapping_directories() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    fs::write(dir1.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir2.path().join("b.txt"), b"dup").unwrap();

    let (report, summary) = finder()
        .find_duplicates(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups()[0].len(), 2);
    assert_eq!(summary.files_discovered, 2);
}

#[test]
fn test_scan_overlapping_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(dir.path().join("a.txt"), b"content").unwrap();
    fs::write(sub.join("b.txt"), b"content").unwrap();

    // Child root listed after its parent must not produce a second copy of b.txt
    let (report, summary) = finder()
        .find_duplicates(&[dir.path().to_path_buf(), sub.clone()])
        .unwrap();

    assert_eq!(summary.files_discovered, 2);
    assert_eq!(report.len(), 1);
    assert_eq!(report.groups()[0].len(), 2);

    // Same when the child comes first
    let (report, summary) = finder()
        .find_duplicates(&[sub, dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(summary.files_discovered, 2);
    assert_eq!(report.groups()[0].len(), 2);
}

#[test]
fn test_same_root_twice() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only.txt"), b"lonely").unwrap();

    let (report, summary) = finder()
        .find_duplicates(&[dir.path().to_path_buf(), dir.path().to_path_buf()])
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.files_discovered, 1);
}

#[test]
fn test_duplicates_within_and_across_roots() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    fs::write(dir1.path().join("x1"), b"shared").unwrap();
    fs::write(dir1.path().join("x2"), b"shared").unwrap();
    fs::write(dir2.path().join("x3"), b"shared").unwrap();
    fs::write(dir2.path().join("y1"), b"local!").unwrap();

    let (report, _) = finder()
        .find_duplicates(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups()[0].len(), 3);
    assert_eq!(report.total_wasted_bytes(), 12);
}

#[test]
fn test_one_missing_root_fails_whole_scan() {
    let dir = tempdir().unwrap();
    let result = finder().find_duplicates(&[dir.path().to_path_buf(), dir.path().join("gone")]);
    assert!(result.is_err());
    assert!(result.unwrap_err().is_configuration_error());
}
