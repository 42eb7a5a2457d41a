use duplicates::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use duplicates::scanner::{FileRecord, WarningKind};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_from_files_continues_when_every_member_is_missing() {
    let finder = DuplicateFinder::with_defaults();
    let file1 = FileRecord::new(PathBuf::from("nonexistent_1.txt"), 100);
    let file2 = FileRecord::new(PathBuf::from("nonexistent_2.txt"), 100);

    let (report, summary) = finder
        .find_duplicates_from_files(vec![file1, file2])
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.warnings.len(), 2);
    for warning in &summary.warnings {
        assert_eq!(warning.kind, WarningKind::Vanished);
    }
}

#[test]
fn test_file_deleted_between_listing_and_hashing() {
    let dir = tempdir().unwrap();
    let keep1 = dir.path().join("keep1");
    let keep2 = dir.path().join("keep2");
    let doomed = dir.path().join("doomed");
    for path in [&keep1, &keep2, &doomed] {
        fs::write(path, b"identical").unwrap();
    }

    let files = vec![
        FileRecord::new(keep1.clone(), 9),
        FileRecord::new(keep2.clone(), 9),
        FileRecord::new(doomed.clone(), 9),
    ];
    fs::remove_file(&doomed).unwrap();

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(report.len(), 1);
    let paths: Vec<&PathBuf> = report.groups()[0].members.iter().map(|m| &m.path).collect();
    assert_eq!(paths, vec![&keep1, &keep2]);
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(summary.warnings[0].path, doomed);
    assert!(summary.has_warnings());
}

#[test]
fn test_file_truncated_between_listing_and_hashing() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let c = dir.path().join("c");
    fs::write(&a, b"0123456789").unwrap();
    fs::write(&b, b"0123456789").unwrap();
    fs::write(&c, b"01234").unwrap();

    // c was listed at its old length
    let files = vec![
        FileRecord::new(a, 10),
        FileRecord::new(b, 10),
        FileRecord::new(c.clone(), 10),
    ];
    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(report.groups()[0].len(), 2);
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(summary.warnings[0].kind, WarningKind::Hash);
    assert_eq!(summary.warnings[0].path, c);
}

#[test]
fn test_warnings_are_sorted_by_path() {
    let files = vec![
        FileRecord::new(PathBuf::from("/missing/z"), 3),
        FileRecord::new(PathBuf::from("/missing/a"), 3),
        FileRecord::new(PathBuf::from("/missing/m"), 3),
    ];
    let (_, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    let paths: Vec<PathBuf> = summary.warnings.iter().map(|w| w.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("/missing/a"),
            PathBuf::from("/missing/m"),
            PathBuf::from("/missing/z")
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_excluded_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same bytes").unwrap();
    fs::write(dir.path().join("b"), b"same bytes").unwrap();
    let locked = dir.path().join("locked");
    fs::write(&locked, b"same bytes").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits, nothing to observe then
    if fs::read(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let (report, summary) = DuplicateFinder::new(FinderConfig::default().with_worker_count(2))
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups()[0].len(), 2);
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(summary.warnings[0].kind, WarningKind::Access);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_a_warning() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"visible").unwrap();
    fs::write(dir.path().join("b"), b"visible").unwrap();
    let closed = dir.path().join("closed");
    fs::create_dir(&closed).unwrap();
    fs::write(closed.join("hidden"), b"visible").unwrap();
    fs::set_permissions(&closed, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&closed).is_ok() {
        fs::set_permissions(&closed, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = DuplicateFinder::new(FinderConfig::default().with_worker_count(2))
        .find_duplicates(&[dir.path().to_path_buf()]);
    fs::set_permissions(&closed, fs::Permissions::from_mode(0o755)).unwrap();

    let (report, summary) = result.unwrap();
    assert_eq!(summary.files_discovered, 2);
    assert_eq!(report.groups()[0].len(), 2);
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(summary.warnings[0].kind, WarningKind::Access);
    assert!(summary.warnings[0].path.ends_with("closed"));
}

#[test]
fn test_shutdown_flag_stops_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"x").unwrap();
    fs::write(dir.path().join("b"), b"x").unwrap();

    let flag = Arc::new(AtomicBool::new(true));
    let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));
    let result = finder.find_duplicates(&[dir.path().to_path_buf()]);

    assert!(matches!(result, Err(FinderError::Interrupted)));
}
