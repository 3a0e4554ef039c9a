use dupescan::duplicates::{DuplicateFinder, FinderConfig};
use dupescan::scanner::WalkerConfig;
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_hardlinks_reported_as_duplicates() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    let hardlink = dir.path().join("hardlink.txt");

    File::create(&original)
        .unwrap()
        .write_all(b"identical content")
        .unwrap();

    if let Err(e) = fs::hard_link(&original, &hardlink) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    // Two directory entries, two candidates, same content.
    let finder = DuplicateFinder::with_defaults();
    let (pairs, summary) = finder.find_duplicates_in(dir.path()).unwrap();

    assert_eq!(summary.candidates, 2);
    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].first.ends_with("hardlink.txt"));
    assert!(pairs[0].second.ends_with("original.txt"));
}

#[test]
#[cfg(unix)]
fn test_symlink_outside_tree_skipped_by_default() {
    let outside = tempdir().unwrap();
    let target = outside.path().join("target.txt");
    fs::write(&target, "linked content").unwrap();

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("copy.txt"), "linked content").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (pairs, summary) = finder.find_duplicates_in(dir.path()).unwrap();

    assert_eq!(summary.candidates, 1);
    assert!(pairs.is_empty());
}

#[test]
#[cfg(unix)]
fn test_symlink_outside_tree_followed_when_enabled() {
    let outside = tempdir().unwrap();
    let target = outside.path().join("target.txt");
    fs::write(&target, "linked content").unwrap();

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("copy.txt"), "linked content").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    let config = FinderConfig::default().with_walker_config(WalkerConfig::new(true, false));
    let (pairs, summary) = DuplicateFinder::new(config)
        .find_duplicates_in(dir.path())
        .unwrap();

    assert_eq!(summary.candidates, 2);
    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].first.ends_with("copy.txt"));
    assert!(pairs[0].second.ends_with("link.txt"));
}

#[test]
#[cfg(unix)]
fn test_symlinked_directory_followed_when_enabled() {
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("inner.txt"), "payload").unwrap();

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "payload").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("linked_dir")).unwrap();

    let (pairs, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in(dir.path())
        .unwrap();
    assert!(pairs.is_empty());

    let config = FinderConfig::default().with_walker_config(WalkerConfig::new(true, false));
    let (pairs, summary) = DuplicateFinder::new(config)
        .find_duplicates_in(dir.path())
        .unwrap();
    assert_eq!(summary.candidates, 2);
    assert_eq!(pairs.len(), 1);
}

#[test]
#[cfg(unix)]
fn test_symlink_cycle_terminates() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("file.txt"), "x").unwrap();
    std::os::unix::fs::symlink(dir.path(), sub.join("loop")).unwrap();

    let config = FinderConfig::default().with_walker_config(WalkerConfig::new(true, false));
    let (pairs, summary) = DuplicateFinder::new(config)
        .find_duplicates_in(dir.path())
        .unwrap();

    assert_eq!(summary.candidates, 1);
    assert!(pairs.is_empty());
}

#[test]
#[cfg(unix)]
fn test_dangling_symlink_ignored() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("real.txt"), "data").unwrap();
    std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();

    for follow in [false, true] {
        let config =
            FinderConfig::default().with_walker_config(WalkerConfig::new(follow, false));
        let (pairs, summary) = DuplicateFinder::new(config)
            .find_duplicates_in(dir.path())
            .unwrap();
        assert_eq!(summary.candidates, 1);
        assert!(pairs.is_empty());
        assert!(summary.errors.is_empty());
    }
}
