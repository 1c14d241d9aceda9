//! Report presentation: ANSI display functions plus pure formatting helpers.

use crate::advice::UpgradeAdvice;
use crate::domain::{Channel, VersionTag};
use crate::runner::{ApplyOutcome, ApplyResult, CompatibilityReport};
use std::collections::BTreeMap;

pub fn display_error(message: &str) {
    eprintln!("\x1b[31mERROR:\x1b[0m {}", message); // Red color
}

pub fn display_success(message: &str) {
    println!("\x1b[32m✓\x1b[0m {}", message); // Green color
}

pub fn display_status(message: &str) {
    println!("\x1b[33m→\x1b[0m {}", message); // Yellow color
}

/// One line per apply result, colored by outcome
pub fn format_apply_line(result: &ApplyResult) -> String {
    let colored_outcome = match result.outcome {
        ApplyOutcome::Clean => format!("\x1b[32m{}\x1b[0m", result.outcome),
        ApplyOutcome::Conflict => format!("\x1b[31m{}\x1b[0m", result.outcome),
        ApplyOutcome::Missing => format!("\x1b[33m{}\x1b[0m", result.outcome),
    };
    format!("  {:<40} {}", result.name, colored_outcome)
}

/// Print the per-patch outcomes, summary counts, and the sandbox branch name
pub fn display_report(report: &CompatibilityReport) {
    println!("\n\x1b[1mPatch compatibility:\x1b[0m");

    for result in &report.results {
        println!("{}", format_apply_line(result));
        if let Some(diagnostic) = &result.diagnostic {
            for line in diagnostic.lines() {
                println!("      {}", line);
            }
        }
    }

    let (clean, conflict, missing) = report.counts();
    println!(
        "\n  {} clean, {} conflict, {} missing",
        clean, conflict, missing
    );
    println!(
        "  Sandbox branch \x1b[36m{}\x1b[0m left behind for inspection",
        report.sandbox_branch
    );
}

/// Print the latest tag per channel
pub fn display_channel_table(latest: &BTreeMap<Channel, VersionTag>) {
    println!("\n\x1b[1mLatest tag per channel:\x1b[0m");

    if latest.is_empty() {
        println!("  (no version tags found)");
        return;
    }

    for (channel, tag) in latest {
        println!("  {:<8} {}", channel.to_string(), tag);
    }
}

/// Print the upgrade recommendation line
pub fn display_upgrade_advice(advice: &UpgradeAdvice) {
    match advice {
        UpgradeAdvice::UpgradeAvailable { .. } => {
            println!("\x1b[33m→\x1b[0m {}", advice);
        }
        _ => {
            println!("  {}", advice);
        }
    }
}
