use duplicates::duplicates::{DuplicateFinder, FinderConfig};
use duplicates::scanner::Hasher;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn finder() -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_worker_count(4))
}

fn canon(path: &Path) -> PathBuf {
    path.canonicalize().unwrap()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (report, summary) = finder()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.files_discovered, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"content a").unwrap();
    fs::write(dir.path().join("b.txt"), b"content b").unwrap();
    fs::write(dir.path().join("c.txt"), b"content c").unwrap();

    let (report, summary) = finder()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.files_discovered, 3);
    assert_eq!(summary.files_hashed, 3);
}

#[test]
fn test_hello_hello_world() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"hello").unwrap();
    fs::write(dir.path().join("b.txt"), b"hello").unwrap();
    fs::write(dir.path().join("c.txt"), b"world").unwrap();

    let (report, _) = finder()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.len(), 1);
    let group = &report.groups()[0];
    assert_eq!(group.length, 5);
    let members: Vec<PathBuf> = group.members.iter().map(|m| m.path.clone()).collect();
    assert_eq!(
        members,
        vec![
            canon(&dir.path().join("a.txt")),
            canon(&dir.path().join("b.txt"))
        ]
    );
    assert!(report
        .group_containing(&canon(&dir.path().join("c.txt")))
        .is_none());
}

#[test]
fn test_large_files_differing_in_last_byte() {
    let dir = tempdir().unwrap();
    let mut content = vec![0x5au8; 10 * 1024 * 1024];
    fs::write(dir.path().join("big1.bin"), &content).unwrap();
    let last = content.len() - 1;
    content[last] = 0x5b;
    fs::write(dir.path().join("big2.bin"), &content).unwrap();

    let (report, summary) = finder()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(report.is_empty());
    // Identical prefixes, so the pre-check cannot separate them
    assert_eq!(summary.eliminated_by_prefilter, 0);
    assert_eq!(summary.files_hashed, 2);
    assert_eq!(summary.bytes_hashed, 2 * 10 * 1024 * 1024);
}

#[test]
fn test_nested_directories() {
    let dir = tempdir().unwrap();
    let deep = dir.path().join("one").join("two").join("three");
    fs::create_dir_all(&deep).unwrap();
    fs::write(dir.path().join("top.dat"), b"nested duplicate").unwrap();
    fs::write(deep.join("bottom.dat"), b"nested duplicate").unwrap();

    let (report, _) = finder()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups()[0].len(), 2);
}

#[test]
fn test_report_order_by_wasted_bytes() {
    let dir = tempdir().unwrap();
    for name in ["s1", "s2", "s3"] {
        fs::write(dir.path().join(name), b"small").unwrap();
    }
    let big = vec![1u8; 1000];
    fs::write(dir.path().join("b1"), &big).unwrap();
    fs::write(dir.path().join("b2"), &big).unwrap();

    let (report, summary) = finder()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(report.groups()[0].length, 1000);
    assert_eq!(report.groups()[1].length, 5);
    assert_eq!(summary.reclaimable_bytes, 1000 + 10);
    assert_eq!(summary.duplicate_files, 3);
}

#[test]
fn test_digest_matches_single_file_hash() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("x");
    File::create(&path).unwrap().write_all(b"abc").unwrap();
    fs::copy(&path, dir.path().join("y")).unwrap();

    let finder = finder();
    let (report, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    let digest = finder.hash_file(&path).unwrap();

    assert_eq!(report.groups()[0].digest, digest);
    assert!(report.find_by_digest(&digest).is_some());
    assert_eq!(digest, Hasher::new().full_hash(&path).unwrap());
}

#[test]
fn test_idempotent_scans() {
    let dir = tempdir().unwrap();
    for i in 0..30 {
        let sub = dir.path().join(format!("d{}", i % 3));
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join(format!("f{}", i)), format!("payload-{}", i % 7)).unwrap();
    }

    let finder = finder();
    let (first, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    let (second, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_prehash_toggle_gives_same_report() {
    let dir = tempdir().unwrap();
    let mut content = vec![9u8; 20_000];
    fs::write(dir.path().join("a"), &content).unwrap();
    fs::write(dir.path().join("b"), &content).unwrap();
    content[0] = 0;
    fs::write(dir.path().join("c"), &content).unwrap();
    content[0] = 9;
    content[1] = 0;
    fs::write(dir.path().join("d"), &content).unwrap();

    let roots = [dir.path().to_path_buf()];
    let (with, with_summary) = finder().find_duplicates(&roots).unwrap();
    let (without, without_summary) = DuplicateFinder::new(
        FinderConfig::default()
            .with_worker_count(2)
            .without_prefilter(),
    )
    .find_duplicates(&roots)
    .unwrap();

    assert_eq!(with, without);
    assert_eq!(with_summary.eliminated_by_prefilter, 2);
    assert_eq!(without_summary.eliminated_by_prefilter, 0);
    assert!(with_summary.bytes_hashed < without_summary.bytes_hashed);
}

#[test]
fn test_single_worker() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_worker_count(1));
    let (report, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(report.len(), 1);
}
