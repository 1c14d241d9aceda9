use crate::error::{PatchCheckError, Result};
use crate::git::{DryRun, Repository, StashToken};
use std::collections::{HashMap, HashSet};

/// Mock repository for testing without actual git operations.
///
/// Tracks enough state to exercise the sandbox lifecycle and the cumulative
/// patch loop: branches, a stash slot, applied diffs, and an operation log
/// for order assertions. Failure injection flags cover the unwind paths.
pub struct MockRepository {
    tags: Vec<String>,
    current: String,
    current_tag: Option<String>,
    dirty: bool,
    branches: HashSet<String>,
    next_stash_id: u32,
    outstanding_stashes: HashSet<String>,
    restore_count: u32,
    applied: Vec<String>,
    conflicts: HashSet<String>,
    requires: HashMap<String, String>,
    fail_create_branch: bool,
    fail_restore: bool,
    ops: Vec<String>,
}

impl MockRepository {
    /// Create a new mock repository positioned on "main" with a clean tree
    pub fn new() -> Self {
        let mut branches = HashSet::new();
        branches.insert("main".to_string());

        MockRepository {
            tags: Vec::new(),
            current: "main".to_string(),
            current_tag: None,
            dirty: false,
            branches,
            next_stash_id: 0,
            outstanding_stashes: HashSet::new(),
            restore_count: 0,
            applied: Vec::new(),
            conflicts: HashSet::new(),
            requires: HashMap::new(),
            fail_create_branch: false,
            fail_restore: false,
            ops: Vec::new(),
        }
    }

    /// Add tags to the repository
    pub fn add_tags(&mut self, tags: &[&str]) {
        self.tags.extend(tags.iter().map(|t| t.to_string()));
    }

    /// Position HEAD on the given reference
    pub fn set_current(&mut self, refname: impl Into<String>) {
        self.current = refname.into();
    }

    /// Set the tag that exactly matches HEAD
    pub fn set_current_tag(&mut self, tag: impl Into<String>) {
        self.current_tag = Some(tag.into());
    }

    /// Mark the working tree as having uncommitted modifications
    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Add a pre-existing local branch
    pub fn add_branch(&mut self, name: impl Into<String>) {
        self.branches.insert(name.into());
    }

    /// Script the given diff content to fail its dry-run check
    pub fn set_conflict(&mut self, content: impl Into<String>) {
        self.conflicts.insert(content.into());
    }

    /// Script the given diff to apply only after another diff has been applied
    pub fn set_requires(&mut self, content: impl Into<String>, prior: impl Into<String>) {
        self.requires.insert(content.into(), prior.into());
    }

    /// Make the next create_branch call fail
    pub fn fail_create_branch(&mut self) {
        self.fail_create_branch = true;
    }

    /// Make stash_restore calls fail
    pub fn fail_restore(&mut self) {
        self.fail_restore = true;
    }

    /// The reference HEAD currently points at
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Diff contents applied so far, in order
    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    /// Number of stashes saved but not yet restored
    pub fn outstanding_stashes(&self) -> usize {
        self.outstanding_stashes.len()
    }

    /// Number of successful stash restores
    pub fn restore_count(&self) -> u32 {
        self.restore_count
    }

    /// Operation log, one entry per mutating call
    pub fn ops(&self) -> &[String] {
        &self.ops
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self.tags.clone())
    }

    fn current_ref(&self) -> Result<String> {
        Ok(self.current.clone())
    }

    fn current_version_tag(&self) -> Result<Option<String>> {
        Ok(self.current_tag.clone())
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.dirty)
    }

    fn checkout(&mut self, refname: &str) -> Result<()> {
        self.ops.push(format!("checkout {}", refname));
        self.current = refname.to_string();
        Ok(())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.branches.contains(name))
    }

    fn create_branch(&mut self, name: &str, target: &str) -> Result<()> {
        self.ops.push(format!("create-branch {} {}", name, target));
        if self.fail_create_branch {
            return Err(PatchCheckError::sandbox(format!(
                "Cannot create branch '{}': injected failure",
                name
            )));
        }
        self.branches.insert(name.to_string());
        Ok(())
    }

    fn delete_branch(&mut self, name: &str) -> Result<()> {
        self.ops.push(format!("delete-branch {}", name));
        if !self.branches.remove(name) {
            return Err(PatchCheckError::sandbox(format!(
                "Cannot find branch '{}'",
                name
            )));
        }
        Ok(())
    }

    fn stash_save(&mut self, _message: &str) -> Result<StashToken> {
        let token = format!("stash-{}", self.next_stash_id);
        self.next_stash_id += 1;
        self.outstanding_stashes.insert(token.clone());
        self.dirty = false;
        self.ops.push(format!("stash-save {}", token));
        Ok(StashToken(token))
    }

    fn stash_restore(&mut self, token: &StashToken) -> Result<()> {
        self.ops.push(format!("stash-restore {}", token.0));
        if self.fail_restore {
            return Err(PatchCheckError::sandbox(format!(
                "Cannot restore saved changes {}: injected failure",
                token.0
            )));
        }
        if !self.outstanding_stashes.remove(&token.0) {
            return Err(PatchCheckError::sandbox(format!(
                "Saved changes {} no longer in the stash list",
                token.0
            )));
        }
        self.restore_count += 1;
        self.dirty = true;
        Ok(())
    }

    fn diff_check(&self, patch: &[u8]) -> Result<DryRun> {
        let content = String::from_utf8_lossy(patch).to_string();

        if self.conflicts.contains(&content) {
            return Ok(DryRun::Conflict("patch does not apply".to_string()));
        }

        if let Some(prior) = self.requires.get(&content) {
            if !self.applied.contains(prior) {
                return Ok(DryRun::Conflict("hunk context not found".to_string()));
            }
        }

        Ok(DryRun::Clean)
    }

    fn apply_diff(&mut self, patch: &[u8]) -> Result<()> {
        let content = String::from_utf8_lossy(patch).to_string();
        self.ops.push(format!("apply {}", content));
        self.applied.push(content);
        Ok(())
    }
}
