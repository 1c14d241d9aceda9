//! Sequential, cumulative patch-compatibility checking.

use crate::error::Result;
use crate::git::{DryRun, Repository};
use crate::patches::PatchSet;
use crate::sandbox::SandboxSession;
use std::fmt;

/// Conflict diagnostics are excerpted, never reproduced in full
pub const MAX_DIAGNOSTIC_LEN: usize = 240;

/// Outcome of testing one patch against the sandbox tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Applied cleanly (and was applied, so later patches see it)
    Clean,
    /// Would not apply; the tree was left untouched
    Conflict,
    /// No artifact of that name exists in storage
    Missing,
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApplyOutcome::Clean => "clean",
            ApplyOutcome::Conflict => "conflict",
            ApplyOutcome::Missing => "missing",
        };
        write!(f, "{}", label)
    }
}

/// Per-patch result; the diagnostic is present only for conflicts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub name: String,
    pub outcome: ApplyOutcome,
    pub diagnostic: Option<String>,
}

/// Complete, order-preserving report over a patch series.
///
/// Always has exactly one entry per input name; the sandbox branch the run
/// left behind is recorded for inspection.
#[derive(Debug, Clone)]
pub struct CompatibilityReport {
    pub results: Vec<ApplyResult>,
    pub sandbox_branch: String,
}

impl CompatibilityReport {
    /// Whether any patch failed to apply or was missing
    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.outcome != ApplyOutcome::Clean)
    }

    /// (clean, conflict, missing) totals
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut clean = 0;
        let mut conflict = 0;
        let mut missing = 0;
        for result in &self.results {
            match result.outcome {
                ApplyOutcome::Clean => clean += 1,
                ApplyOutcome::Conflict => conflict += 1,
                ApplyOutcome::Missing => missing += 1,
            }
        }
        (clean, conflict, missing)
    }
}

/// Tests an ordered patch series against a sandbox tree.
///
/// The loop is a left-fold over the series with the working tree as the
/// accumulator: each clean patch is applied before the next is checked, so
/// the run models the real stacked-patch workflow. A conflicting patch is
/// recorded and skipped; it never stops the loop and never contaminates the
/// tree seen by later patches.
pub struct CompatibilityRunner<'p> {
    patches: &'p PatchSet,
}

impl<'p> CompatibilityRunner<'p> {
    pub fn new(patches: &'p PatchSet) -> Self {
        CompatibilityRunner { patches }
    }

    /// Check every patch in order against the sandbox's current tree
    pub fn run<R: Repository>(
        &self,
        session: &mut SandboxSession<'_, R>,
    ) -> Result<CompatibilityReport> {
        let mut results = Vec::with_capacity(self.patches.len());

        for name in self.patches.names() {
            let result = match self.patches.load(name)? {
                None => ApplyResult {
                    name: name.clone(),
                    outcome: ApplyOutcome::Missing,
                    diagnostic: None,
                },
                Some(artifact) => match session.repo().diff_check(artifact.content())? {
                    DryRun::Clean => {
                        session.repo().apply_diff(artifact.content())?;
                        ApplyResult {
                            name: name.clone(),
                            outcome: ApplyOutcome::Clean,
                            diagnostic: None,
                        }
                    }
                    DryRun::Conflict(diagnostic) => ApplyResult {
                        name: name.clone(),
                        outcome: ApplyOutcome::Conflict,
                        diagnostic: Some(excerpt(&diagnostic)),
                    },
                },
            };

            results.push(result);
        }

        Ok(CompatibilityReport {
            results,
            sandbox_branch: session.branch_name().to_string(),
        })
    }
}

/// Bound a diagnostic to [MAX_DIAGNOSTIC_LEN] characters
fn excerpt(diagnostic: &str) -> String {
    if diagnostic.chars().count() <= MAX_DIAGNOSTIC_LEN {
        return diagnostic.to_string();
    }

    let mut out: String = diagnostic.chars().take(MAX_DIAGNOSTIC_LEN).collect();
    out.push_str("...");
    out
}
