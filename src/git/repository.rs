use crate::error::{PatchCheckError, Result};
use crate::git::{DryRun, StashToken};
use git2::build::CheckoutBuilder;
use git2::{
    ApplyLocation, ApplyOptions, BranchType, DescribeOptions, Diff, ErrorCode, ObjectType, Oid,
    Repository as Git2Repo, Signature, StashFlags, StatusOptions,
};
use std::path::Path;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn signature(&self) -> Result<Signature<'static>> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            // Repositories without user.name/user.email still need a signature
            // for stash commits.
            Err(_) => Ok(Signature::now("patch-check", "patch-check@localhost")?),
        }
    }
}

impl super::Repository for Git2Repository {
    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn current_ref(&self) -> Result<String> {
        let head = self.repo.head().map_err(|e| {
            PatchCheckError::sandbox(format!("Cannot resolve current HEAD: {}", e))
        })?;

        if head.is_branch() {
            head.shorthand()
                .map(|s| s.to_string())
                .ok_or_else(|| PatchCheckError::sandbox("Current branch name is not valid UTF-8"))
        } else {
            let commit = head.peel_to_commit().map_err(|e| {
                PatchCheckError::sandbox(format!("Cannot resolve detached HEAD: {}", e))
            })?;
            Ok(commit.id().to_string())
        }
    }

    fn current_version_tag(&self) -> Result<Option<String>> {
        let mut opts = DescribeOptions::new();
        opts.describe_tags().max_candidates_tags(0);

        // Exact-match describe fails whenever HEAD carries no tag; that is a
        // normal state for this advisory lookup, not an error.
        match self.repo.describe(&opts) {
            Ok(description) => Ok(description.format(None).ok()),
            Err(_) => Ok(None),
        }
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(!statuses.is_empty())
    }

    fn checkout(&mut self, refname: &str) -> Result<()> {
        let (object, reference) = self.repo.revparse_ext(refname).map_err(|e| {
            PatchCheckError::sandbox(format!("Cannot resolve '{}': {}", refname, e))
        })?;

        // Forced: patch runs leave uncommitted modifications on the sandbox
        // branch, and leaving the sandbox must discard them. The caller's own
        // edits are never at stake here; they live in the stash by the time
        // any checkout happens.
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo
            .checkout_tree(&object, Some(&mut checkout))
            .map_err(|e| {
                PatchCheckError::sandbox(format!("Cannot check out '{}': {}", refname, e))
            })?;

        // Only branch references move HEAD symbolically; tags and raw
        // commits detach.
        let branch_ref = reference
            .and_then(|r| r.name().map(|n| n.to_string()))
            .filter(|n| n.starts_with("refs/heads/"));

        match branch_ref {
            Some(name) => self.repo.set_head(&name)?,
            None => {
                let commit = object.peel(ObjectType::Commit).map_err(|e| {
                    PatchCheckError::sandbox(format!(
                        "'{}' does not point at a commit: {}",
                        refname, e
                    ))
                })?;
                self.repo.set_head_detached(commit.id())?;
            }
        }

        Ok(())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_branch(&mut self, name: &str, target: &str) -> Result<()> {
        let object = self.repo.revparse_single(target).map_err(|e| {
            PatchCheckError::sandbox(format!("Cannot resolve revision '{}': {}", target, e))
        })?;

        let commit = object
            .peel(ObjectType::Commit)
            .map_err(|e| {
                PatchCheckError::sandbox(format!(
                    "Revision '{}' does not point at a commit: {}",
                    target, e
                ))
            })?
            .into_commit()
            .map_err(|_| {
                PatchCheckError::sandbox(format!("Revision '{}' is not a commit", target))
            })?;

        self.repo
            .branch(name, &commit, false)
            .map_err(|e| PatchCheckError::sandbox(format!("Cannot create branch '{}': {}", name, e)))?;

        Ok(())
    }

    fn delete_branch(&mut self, name: &str) -> Result<()> {
        let mut branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(|e| PatchCheckError::sandbox(format!("Cannot find branch '{}': {}", name, e)))?;

        branch
            .delete()
            .map_err(|e| PatchCheckError::sandbox(format!("Cannot delete branch '{}': {}", name, e)))?;

        Ok(())
    }

    fn stash_save(&mut self, message: &str) -> Result<StashToken> {
        let signature = self.signature()?;

        let oid = self
            .repo
            .stash_save(&signature, message, Some(StashFlags::INCLUDE_UNTRACKED))
            .map_err(|e| {
                PatchCheckError::sandbox(format!("Cannot save uncommitted changes: {}", e))
            })?;

        Ok(StashToken(oid.to_string()))
    }

    fn stash_restore(&mut self, token: &StashToken) -> Result<()> {
        let target = Oid::from_str(&token.0)
            .map_err(|e| PatchCheckError::sandbox(format!("Invalid stash token: {}", e)))?;

        let mut index = None;
        self.repo
            .stash_foreach(|i, _message, oid| {
                if *oid == target {
                    index = Some(i);
                    false
                } else {
                    true
                }
            })
            .map_err(|e| {
                PatchCheckError::sandbox(format!("Cannot inspect the stash list: {}", e))
            })?;

        let index = index.ok_or_else(|| {
            PatchCheckError::sandbox(format!("Saved changes {} no longer in the stash list", target))
        })?;

        self.repo.stash_pop(index, None).map_err(|e| {
            PatchCheckError::sandbox(format!(
                "Cannot restore saved changes {} (left in the stash list): {}",
                target, e
            ))
        })?;

        Ok(())
    }

    fn diff_check(&self, patch: &[u8]) -> Result<DryRun> {
        // A diff libgit2 cannot even parse would certainly not apply; fold
        // that into the conflict outcome instead of aborting the run.
        let diff = match Diff::from_buffer(patch) {
            Ok(diff) => diff,
            Err(e) => return Ok(DryRun::Conflict(format!("unreadable diff: {}", e))),
        };

        let mut opts = ApplyOptions::new();
        opts.check(true);

        match self.repo.apply(&diff, ApplyLocation::WorkDir, Some(&mut opts)) {
            Ok(()) => Ok(DryRun::Clean),
            Err(e) => Ok(DryRun::Conflict(e.message().to_string())),
        }
    }

    fn apply_diff(&mut self, patch: &[u8]) -> Result<()> {
        let diff = Diff::from_buffer(patch)?;

        self.repo.apply(&diff, ApplyLocation::WorkDir, None)?;

        Ok(())
    }
}
