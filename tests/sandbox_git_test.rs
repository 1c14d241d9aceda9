// tests/sandbox_git_test.rs
//
// Sandbox lifecycle against real git repositories.

use git2::{Oid, Repository as RawRepository};
use patch_check::git::{Git2Repository, Repository};
use patch_check::sandbox::SandboxSession;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn init_repo(dir: &Path) -> RawRepository {
    let repo = RawRepository::init(dir).expect("init repository");
    let mut config = repo.config().expect("repo config");
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();
    repo
}

fn commit_file(repo: &RawRepository, name: &str, content: &str, message: &str) -> Oid {
    let workdir = repo.workdir().expect("workdir").to_path_buf();
    fs::write(workdir.join(name), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = repo.signature().unwrap();

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

fn tag_head(repo: &RawRepository, name: &str) {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.tag_lightweight(name, head.as_object(), false).unwrap();
}

fn stash_depth(dir: &Path) -> usize {
    let mut repo = RawRepository::open(dir).unwrap();
    let mut count = 0;
    repo.stash_foreach(|_, _, _| {
        count += 1;
        true
    })
    .unwrap();
    count
}

#[test]
#[serial]
fn test_round_trip_preserves_dirty_worktree() {
    let dir = TempDir::new().unwrap();
    let raw = init_repo(dir.path());
    commit_file(&raw, "hello.txt", "line one\nalpha\nline three\n", "initial");
    tag_head(&raw, "142.0.7444.134");

    // Uncommitted edit plus an untracked file
    fs::write(dir.path().join("hello.txt"), "work in progress\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "untracked notes\n").unwrap();

    let mut repo = Git2Repository::from_git2(raw);
    let original_ref = repo.current_ref().unwrap();

    let session = SandboxSession::begin(&mut repo, "142.0.7444.134").unwrap();

    // Inside the sandbox the tree shows the target revision, not the edits
    let sandboxed = fs::read_to_string(dir.path().join("hello.txt")).unwrap();
    assert_eq!(sandboxed, "line one\nalpha\nline three\n");
    assert!(!dir.path().join("notes.txt").exists());

    session.end().unwrap();

    // Bit-for-bit restoration of the pre-begin state
    let restored = fs::read_to_string(dir.path().join("hello.txt")).unwrap();
    assert_eq!(restored, "work in progress\n");
    let notes = fs::read_to_string(dir.path().join("notes.txt")).unwrap();
    assert_eq!(notes, "untracked notes\n");

    assert_eq!(repo.current_ref().unwrap(), original_ref);
    assert_eq!(stash_depth(dir.path()), 0);
}

#[test]
#[serial]
fn test_clean_tree_needs_no_stash() {
    let dir = TempDir::new().unwrap();
    let raw = init_repo(dir.path());
    commit_file(&raw, "hello.txt", "alpha\n", "initial");
    tag_head(&raw, "143.0.7468.1");

    let mut repo = Git2Repository::from_git2(raw);
    let original_ref = repo.current_ref().unwrap();

    let session = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap();
    assert_eq!(session.branch_name(), "test-patches-143.0.7468.1");
    session.end().unwrap();

    assert_eq!(repo.current_ref().unwrap(), original_ref);
    assert_eq!(stash_depth(dir.path()), 0);
}

#[test]
#[serial]
fn test_sandbox_branch_is_left_behind_and_recreated() {
    let dir = TempDir::new().unwrap();
    let raw = init_repo(dir.path());
    commit_file(&raw, "hello.txt", "alpha\n", "initial");
    tag_head(&raw, "143.0.7468.1");

    let mut repo = Git2Repository::from_git2(raw);

    let session = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap();
    session.end().unwrap();
    assert!(repo.branch_exists("test-patches-143.0.7468.1").unwrap());

    // A second run against the same revision replaces the stale branch
    let session = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap();
    session.end().unwrap();
    assert!(repo.branch_exists("test-patches-143.0.7468.1").unwrap());
}

#[test]
#[serial]
fn test_detached_head_position_is_restored() {
    let dir = TempDir::new().unwrap();
    let raw = init_repo(dir.path());
    commit_file(&raw, "hello.txt", "alpha\n", "first");
    tag_head(&raw, "142.0.7444.134");
    commit_file(&raw, "hello.txt", "beta\n", "second");
    tag_head(&raw, "143.0.7468.1");

    let mut repo = Git2Repository::from_git2(raw);

    // Detach at the older tag, as an upstream checkout typically sits
    repo.checkout("142.0.7444.134").unwrap();
    let original_ref = repo.current_ref().unwrap();

    let session = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap();
    session.end().unwrap();

    assert_eq!(repo.current_ref().unwrap(), original_ref);
    let content = fs::read_to_string(dir.path().join("hello.txt")).unwrap();
    assert_eq!(content, "alpha\n");
}

#[test]
#[serial]
fn test_begin_against_unknown_revision_unwinds() {
    let dir = TempDir::new().unwrap();
    let raw = init_repo(dir.path());
    commit_file(&raw, "hello.txt", "alpha\n", "initial");

    fs::write(dir.path().join("hello.txt"), "work in progress\n").unwrap();

    let mut repo = Git2Repository::from_git2(raw);
    let err = SandboxSession::begin(&mut repo, "999.0.0.999").unwrap_err();
    assert!(err.is_sandbox());

    // The failed begin put everything back: edits in place, stash empty
    let content = fs::read_to_string(dir.path().join("hello.txt")).unwrap();
    assert_eq!(content, "work in progress\n");
    assert_eq!(stash_depth(dir.path()), 0);
}

#[test]
#[serial]
fn test_current_version_tag_exact_match_only() {
    let dir = TempDir::new().unwrap();
    let raw = init_repo(dir.path());
    commit_file(&raw, "hello.txt", "alpha\n", "first");
    tag_head(&raw, "142.0.7444.134");

    let repo = Git2Repository::from_git2(raw);
    assert_eq!(
        repo.current_version_tag().unwrap(),
        Some("142.0.7444.134".to_string())
    );

    let dir2 = TempDir::new().unwrap();
    let raw2 = init_repo(dir2.path());
    commit_file(&raw2, "hello.txt", "alpha\n", "first");

    let repo2 = Git2Repository::from_git2(raw2);
    assert_eq!(repo2.current_version_tag().unwrap(), None);
}
