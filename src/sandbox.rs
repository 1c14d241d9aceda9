//! Disposable working-tree sessions for non-destructive patch testing.
//!
//! A [SandboxSession] checks out a throwaway branch rooted at a target
//! revision while guaranteeing the caller's original position and any
//! uncommitted edits survive. Acquisition happens in [SandboxSession::begin],
//! release in [SandboxSession::end]; dropping the session releases too, so
//! cleanup runs on every exit path including unwinding.

use crate::error::{PatchCheckError, Result};
use crate::git::{Repository, StashToken};
use crate::ui;

/// Prefix of the deterministic sandbox branch name
const SANDBOX_BRANCH_PREFIX: &str = "test-patches";

/// The branch name used for a given target revision
pub fn sandbox_branch_name(target: &str) -> String {
    format!("{}-{}", SANDBOX_BRANCH_PREFIX, target)
}

/// Recorded state needed to put the repository back the way it was.
///
/// Created by [SandboxSession::begin] and torn down exactly once; the stash
/// token is cleared after a restore attempt so it can never be applied twice.
#[derive(Debug)]
pub struct SandboxState {
    original_ref: String,
    stash: Option<StashToken>,
    branch: String,
}

impl SandboxState {
    /// The caller's position before the sandbox was created
    pub fn original_ref(&self) -> &str {
        &self.original_ref
    }

    /// The sandbox branch name (left behind for inspection)
    pub fn branch(&self) -> &str {
        &self.branch
    }
}

/// Scoped guard over a repository positioned on a sandbox branch.
///
/// Holds the only mutable reference to the repository for its lifetime, so
/// no second sandbox can be active against the same repository at once.
pub struct SandboxSession<'r, R: Repository> {
    repo: &'r mut R,
    state: Option<SandboxState>,
}

impl<'r, R: Repository> std::fmt::Debug for SandboxSession<'r, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxSession")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'r, R: Repository> SandboxSession<'r, R> {
    /// Create a sandbox branch rooted at `target` and check it out.
    ///
    /// Records the current HEAD, saves any uncommitted modifications, then
    /// recreates the deterministic sandbox branch. If branch setup fails
    /// after modifications were saved, they are restored before the error
    /// propagates; a failed `begin` leaves the tree exactly as it found it.
    pub fn begin(repo: &'r mut R, target: &str) -> Result<Self> {
        let original_ref = repo.current_ref()?;

        let stash = if repo.is_dirty()? {
            let message = format!("patch-check: uncommitted work from {}", original_ref);
            Some(repo.stash_save(&message)?)
        } else {
            None
        };

        let branch = sandbox_branch_name(target);

        if let Err(setup_err) = setup_branch(repo, &branch, target) {
            // Unwind partial progress before surfacing the failure; the
            // saved modifications must not be left orphaned.
            let _ = repo.checkout(&original_ref);
            if let Some(token) = stash {
                repo.stash_restore(&token).map_err(|restore_err| {
                    PatchCheckError::sandbox(format!(
                        "{}; additionally failed to restore saved changes: {}",
                        setup_err, restore_err
                    ))
                })?;
            }
            return Err(setup_err);
        }

        Ok(SandboxSession {
            repo,
            state: Some(SandboxState {
                original_ref,
                stash,
                branch,
            }),
        })
    }

    /// The sandbox branch name
    pub fn branch_name(&self) -> &str {
        self.state
            .as_ref()
            .map(|s| s.branch.as_str())
            .unwrap_or(SANDBOX_BRANCH_PREFIX)
    }

    /// Access to the underlying repository, positioned on the sandbox branch
    pub fn repo(&mut self) -> &mut R {
        self.repo
    }

    /// Restore the original position and any saved modifications.
    ///
    /// The sandbox branch is deliberately not deleted; it stays behind for
    /// manual inspection. Failures here risk losing the caller's edits and
    /// surface as [PatchCheckError::Sandbox].
    pub fn end(mut self) -> Result<()> {
        self.teardown()
    }

    /// Idempotent release: the first call restores, later calls are no-ops.
    fn teardown(&mut self) -> Result<()> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        // Leave the state in place if the checkout fails so a retry (or the
        // drop guard) can attempt the restore again.
        self.repo.checkout(&state.original_ref).map_err(|e| {
            PatchCheckError::sandbox(format!(
                "Cannot return to '{}': {}",
                state.original_ref, e
            ))
        })?;

        // Take the token before restoring: a restore must never run twice,
        // even if it fails partway (the stash entry survives a failed pop).
        if let Some(token) = state.stash.take() {
            if let Err(e) = self.repo.stash_restore(&token) {
                self.state = None;
                return Err(e);
            }
        }

        self.state = None;
        Ok(())
    }
}

impl<R: Repository> Drop for SandboxSession<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            // A teardown failure here risks silent loss of the caller's
            // edits; it must never pass quietly.
            ui::display_error(&format!("sandbox cleanup failed: {}", e));
        }
    }
}

/// Delete any stale sandbox branch of the same name, then create and check
/// out a fresh one rooted at the target revision.
fn setup_branch<R: Repository>(repo: &mut R, branch: &str, target: &str) -> Result<()> {
    if repo.branch_exists(branch)? {
        repo.delete_branch(branch)?;
    }
    repo.create_branch(branch, target)?;
    repo.checkout(branch)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    #[test]
    fn test_begin_clean_tree_takes_no_stash() {
        let mut repo = MockRepository::new();

        let session = SandboxSession::begin(&mut repo, "142.0.7444.134").unwrap();
        assert_eq!(session.branch_name(), "test-patches-142.0.7444.134");
        session.end().unwrap();

        assert_eq!(repo.outstanding_stashes(), 0);
        assert_eq!(repo.restore_count(), 0);
        assert_eq!(repo.current(), "main");
    }

    #[test]
    fn test_begin_dirty_tree_stashes_and_end_restores() {
        let mut repo = MockRepository::new();
        repo.set_dirty(true);

        let session = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap();
        session.end().unwrap();

        assert_eq!(repo.restore_count(), 1);
        assert_eq!(repo.outstanding_stashes(), 0);
        assert!(repo.is_dirty().unwrap());
        assert_eq!(repo.current(), "main");
    }

    #[test]
    fn test_end_then_drop_never_restores_twice() {
        let mut repo = MockRepository::new();
        repo.set_dirty(true);

        {
            let session = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap();
            // end() consumes the session; the drop that follows must be a no-op
            session.end().unwrap();
        }

        assert_eq!(repo.restore_count(), 1);
    }

    #[test]
    fn test_drop_without_end_still_cleans_up() {
        let mut repo = MockRepository::new();
        repo.set_dirty(true);

        {
            let _session = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap();
            // Session goes out of scope without an explicit end, as it would
            // when an error unwinds through the caller.
        }

        assert_eq!(repo.restore_count(), 1);
        assert_eq!(repo.current(), "main");
    }

    #[test]
    fn test_begin_failure_unwinds_stash() {
        let mut repo = MockRepository::new();
        repo.set_dirty(true);
        repo.fail_create_branch();

        let err = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap_err();
        assert!(err.is_sandbox());

        // The stash taken in begin was restored before the error surfaced
        assert_eq!(repo.outstanding_stashes(), 0);
        assert_eq!(repo.restore_count(), 1);
        assert!(repo.is_dirty().unwrap());
        assert_eq!(repo.current(), "main");
    }

    #[test]
    fn test_begin_recreates_stale_sandbox_branch() {
        let mut repo = MockRepository::new();
        repo.add_branch("test-patches-143.0.7468.1");

        let session = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap();
        session.end().unwrap();

        let ops = repo.ops().join("\n");
        assert!(ops.contains("delete-branch test-patches-143.0.7468.1"));
        assert!(ops.contains("create-branch test-patches-143.0.7468.1"));
    }

    #[test]
    fn test_sandbox_branch_survives_end() {
        let mut repo = MockRepository::new();

        let session = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap();
        session.end().unwrap();

        assert!(repo.branch_exists("test-patches-143.0.7468.1").unwrap());
    }

    #[test]
    fn test_end_surfaces_restore_failure_once() {
        let mut repo = MockRepository::new();
        repo.set_dirty(true);

        {
            let mut session = SandboxSession::begin(&mut repo, "143.0.7468.1").unwrap();
            session.repo().fail_restore();
            assert!(session.end().is_err());
        }

        // The failed restore consumed the token; nothing was restored and
        // nothing will retry it.
        assert_eq!(repo.restore_count(), 0);
    }

    #[test]
    fn test_branch_name_is_deterministic() {
        assert_eq!(
            sandbox_branch_name("142.0.7444.134"),
            "test-patches-142.0.7444.134"
        );
    }
}
