use anyhow::Result;
use clap::Parser;

use patch_check::advice::UpgradeAdvice;
use patch_check::classifier::{ChannelClassifier, ChannelPolicy};
use patch_check::config;
use patch_check::domain::{Channel, VersionTag};
use patch_check::git::{Git2Repository, Repository};
use patch_check::patches::PatchSet;
use patch_check::runner::{CompatibilityReport, CompatibilityRunner};
use patch_check::sandbox::SandboxSession;
use patch_check::ui;

#[derive(clap::Parser)]
#[command(
    name = "patch-check",
    about = "Classify upstream release tags and test whether the maintained patches still apply"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Path to the upstream checkout")]
    repo: Option<String>,

    #[arg(short, long, help = "Directory containing the maintained patches")]
    patches: Option<String>,

    #[arg(
        short = 't',
        long,
        help = "Revision to test against (defaults to the latest stable tag)"
    )]
    revision: Option<String>,

    #[arg(long, help = "Show the channel summary and exit without testing patches")]
    channels: bool,

    #[arg(short, long, help = "Print version information")]
    version: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        println!("patch-check {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration
    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(2);
        }
    };

    let repo_path = args.repo.unwrap_or_else(|| config.paths.repo.clone());
    let patches_dir = args.patches.unwrap_or_else(|| config.paths.patches.clone());

    // Open the upstream checkout
    let mut repo = match Git2Repository::open(&repo_path) {
        Ok(repo) => repo,
        Err(e) => {
            ui::display_error(&format!("Git repository error: {}", e));
            std::process::exit(2);
        }
    };

    let classifier = match ChannelClassifier::new(ChannelPolicy {
        stable_patch_threshold: config.policy.stable_patch_threshold,
    }) {
        Ok(classifier) => classifier,
        Err(e) => {
            ui::display_error(&format!("Classifier error: {}", e));
            std::process::exit(2);
        }
    };

    // Classify every upstream tag and show the channel summary
    let raw_tags = match repo.list_tags() {
        Ok(tags) => tags,
        Err(e) => {
            ui::display_error(&format!("Failed to list tags: {}", e));
            std::process::exit(2);
        }
    };

    let tags = classifier.version_tags(&raw_tags);
    if tags.is_empty() {
        ui::display_error("No version tags found in the repository");
        std::process::exit(2);
    }

    let classified = classifier.classify_all(&tags);
    let latest = classifier.latest_per_channel(&classified);
    ui::display_channel_table(&latest);

    let current = match repo.current_version_tag() {
        Ok(Some(tag)) => VersionTag::parse(&tag).ok(),
        _ => None,
    };
    let advice = UpgradeAdvice::evaluate(current.as_ref(), latest.get(&Channel::Stable));
    ui::display_upgrade_advice(&advice);

    if args.channels {
        return Ok(());
    }

    // Pick the revision to test against
    let target = args
        .revision
        .or_else(|| latest.get(&Channel::Stable).map(|t| t.name().to_string()));
    let target = match target {
        Some(target) => target,
        None => {
            ui::display_error("No revision to test: no stable tag found and none given");
            std::process::exit(2);
        }
    };

    // Assemble the patch series
    let patch_set = if config.patches.order.is_empty() {
        match PatchSet::discover(&patches_dir) {
            Ok(set) => set,
            Err(e) => {
                ui::display_error(&format!(
                    "Cannot read patch directory '{}': {}",
                    patches_dir, e
                ));
                std::process::exit(2);
            }
        }
    } else {
        PatchSet::new(&patches_dir, config.patches.order.clone())
    };

    if patch_set.is_empty() {
        ui::display_status("No patches to test");
        return Ok(());
    }

    ui::display_status(&format!(
        "Testing {} patches against {}",
        patch_set.len(),
        target
    ));

    let report = match run_compatibility(&mut repo, &patch_set, &target) {
        Ok(report) => report,
        Err(e) if e.is_sandbox() => {
            ui::display_error(&format!("SANDBOX FAILURE: {}", e));
            ui::display_error(
                "Your original work may need manual recovery; check `git stash list`.",
            );
            std::process::exit(2);
        }
        Err(e) => {
            ui::display_error(&format!("Patch run failed: {}", e));
            std::process::exit(2);
        }
    };

    ui::display_report(&report);

    if report.has_failures() {
        std::process::exit(1);
    }

    ui::display_success("All patches apply cleanly");
    Ok(())
}

/// Run the patch series inside a sandbox, always tearing it down.
///
/// No process exit happens while the sandbox is alive, so the restore path
/// runs on every outcome. A teardown failure outranks a runner failure: it
/// is the one that risks losing the caller's edits.
fn run_compatibility(
    repo: &mut Git2Repository,
    patch_set: &PatchSet,
    target: &str,
) -> patch_check::Result<CompatibilityReport> {
    let mut session = SandboxSession::begin(repo, target)?;
    let outcome = CompatibilityRunner::new(patch_set).run(&mut session);
    let ended = session.end();

    match (outcome, ended) {
        (Ok(report), Ok(())) => Ok(report),
        (_, Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
    }
}
