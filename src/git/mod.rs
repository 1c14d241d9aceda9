//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! operations patch-check needs, allowing for multiple implementations
//! including real Git repositories and mock implementations for testing.
//!
//! The primary abstraction is the [Repository] trait. Concrete
//! implementations:
//!
//! - [repository::Git2Repository]: a real implementation using the `git2` crate
//! - [mock::MockRepository]: an in-memory implementation for testing
//!
//! Most code should depend on the [Repository] trait rather than concrete
//! implementations; the sandbox and the compatibility runner are both
//! generic over it.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;

/// Opaque handle to a saved set of uncommitted modifications.
///
/// Returned by [Repository::stash_save] and consumed by
/// [Repository::stash_restore]. The inner value identifies the saved state
/// to the backing implementation and has no meaning to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashToken(pub String);

/// Outcome of a non-mutating "would this diff apply" check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DryRun {
    /// The diff applies cleanly to the current working tree
    Clean,
    /// The diff does not apply; carries the underlying diagnostic
    Conflict(String),
}

/// Common version-control operations used by the sandbox and the runner.
///
/// Mutating operations take `&mut self`; the working tree behind an
/// implementation is a single shared resource and callers are expected to
/// hold the only reference while a sandbox is active.
pub trait Repository {
    /// All tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// The current HEAD as a restorable reference.
    ///
    /// Returns the branch short name when HEAD is on a branch, otherwise the
    /// commit id of the detached HEAD. Passing the returned value to
    /// [Repository::checkout] restores the original position either way.
    fn current_ref(&self) -> Result<String>;

    /// The tag exactly matching the current HEAD, if any.
    ///
    /// Used only for upgrade advice; resolution failures degrade to
    /// `Ok(None)` rather than erroring.
    fn current_version_tag(&self) -> Result<Option<String>>;

    /// Whether the working tree has uncommitted modifications
    /// (including untracked files)
    fn is_dirty(&self) -> Result<bool>;

    /// Check out a reference by name (branch, tag, or commit id)
    fn checkout(&mut self, refname: &str) -> Result<()>;

    /// Whether a local branch with this name exists
    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Create a local branch rooted at the given revision
    fn create_branch(&mut self, name: &str, target: &str) -> Result<()>;

    /// Delete a local branch
    fn delete_branch(&mut self, name: &str) -> Result<()>;

    /// Save uncommitted modifications as a reversible unit.
    ///
    /// The working tree must be dirty when this is called; the returned
    /// token restores the exact saved state via [Repository::stash_restore].
    fn stash_save(&mut self, message: &str) -> Result<StashToken>;

    /// Restore a previously saved set of modifications.
    ///
    /// Consuming semantics: after a successful restore the token is spent
    /// and must not be restored again.
    fn stash_restore(&mut self, token: &StashToken) -> Result<()>;

    /// Non-mutating check of whether a diff would apply to the working tree
    fn diff_check(&self, patch: &[u8]) -> Result<DryRun>;

    /// Apply a diff to the working tree
    fn apply_diff(&mut self, patch: &[u8]) -> Result<()>;
}
