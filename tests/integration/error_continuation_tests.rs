use dupescan::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupescan::scanner::{CandidateSet, FileEntry, HashError, ScanError};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_missing_files_recorded_and_skipped() {
    let dir = tempdir().unwrap();
    let present_a = dir.path().join("a.txt");
    let present_b = dir.path().join("b.txt");
    fs::write(&present_a, "same").unwrap();
    fs::write(&present_b, "same").unwrap();

    let candidates: CandidateSet = vec![
        FileEntry::new(PathBuf::from("nonexistent_1.txt"), 4),
        FileEntry::new(present_a, 4),
        FileEntry::new(PathBuf::from("nonexistent_2.txt"), 4),
        FileEntry::new(present_b, 4),
    ]
    .into_iter()
    .collect();

    let finder = DuplicateFinder::with_defaults();
    let (pairs, summary) = finder.find_duplicates(&candidates);

    assert_eq!(pairs.len(), 1);
    assert_eq!(summary.failed_files, 2);
    assert_eq!(summary.errors.len(), 2);
    for err in &summary.errors {
        match err {
            HashError::NotFound(_) => {}
            other => panic!("Expected NotFound HashError, got: {:?}", other),
        }
    }
    assert_eq!(summary.comparisons_planned, 6);
    assert_eq!(summary.comparisons_performed, 1);
    assert_eq!(summary.comparisons_skipped, 5);
    assert!(!summary.interrupted);
}

#[test]
fn test_file_removed_after_collection() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "hello").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let candidates = finder.collect(dir.path()).unwrap();
    fs::remove_file(dir.path().join("b.txt")).unwrap();

    let (pairs, summary) = finder.find_duplicates(&candidates);

    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].first.ends_with("a.txt"));
    assert!(pairs[0].second.ends_with("c.txt"));
    assert_eq!(summary.failed_files, 1);
    assert!(summary.errors[0].path().ends_with("b.txt"));
}

#[test]
#[cfg(unix)]
fn test_inaccessible_subdirectory_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "visible").unwrap();
    fs::write(dir.path().join("b.txt"), "visible").unwrap();

    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden_copy.txt"), "visible").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; nothing to test there.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = DuplicateFinder::with_defaults().find_duplicates_in(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let (pairs, summary) = result.unwrap();
    assert_eq!(summary.candidates, 2);
    assert_eq!(pairs.len(), 1);
    assert!(summary.errors.is_empty());
}

#[test]
#[cfg(unix)]
fn test_unreadable_file_not_a_candidate() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "same").unwrap();
    let secret = dir.path().join("secret.txt");
    fs::write(&secret, "same").unwrap();
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::File::open(&secret).is_ok() {
        return;
    }

    let (pairs, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in(dir.path())
        .unwrap();
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(summary.candidates, 1);
    assert!(pairs.is_empty());
}

#[test]
fn test_nonexistent_root_is_fatal() {
    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates_in(std::path::Path::new("/nonexistent/dupescan/root"));

    match result {
        Err(FinderError::ScanError(ScanError::NotFound(_))) => {}
        other => panic!("Expected NotFound ScanError, got: {:?}", other),
    }
}

#[test]
fn test_file_root_is_fatal() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, "x").unwrap();

    let result = DuplicateFinder::with_defaults().find_duplicates_in(&file);
    assert!(matches!(
        result,
        Err(FinderError::ScanError(ScanError::NotADirectory(_)))
    ));
}

#[test]
fn test_interrupt_during_collection() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "x").unwrap();

    let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));

    assert!(matches!(
        finder.find_duplicates_in(dir.path()),
        Err(FinderError::Interrupted)
    ));
}
