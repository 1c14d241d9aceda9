use crate::domain::VersionTag;
use std::fmt;

/// Upgrade guidance derived from comparing the caller's current major
/// version against the Stable channel's major.
#[derive(Debug, Clone, PartialEq)]
pub enum UpgradeAdvice {
    /// The stable channel moved past the current major
    UpgradeAvailable { current_major: u32, stable: String },
    /// Current major matches the stable channel
    OnLatestMajor { major: u32 },
    /// Current major is newer than stable (e.g. tracking Canary)
    AheadOfStable {
        current_major: u32,
        stable_major: u32,
    },
    /// No tag classified as Stable, nothing to compare against
    NoStableTag,
    /// The current version could not be determined
    CurrentUnknown,
}

impl UpgradeAdvice {
    /// Compare the current version (when known) against the latest Stable tag
    pub fn evaluate(current: Option<&VersionTag>, stable: Option<&VersionTag>) -> Self {
        let Some(stable) = stable else {
            return UpgradeAdvice::NoStableTag;
        };
        let Some(current) = current else {
            return UpgradeAdvice::CurrentUnknown;
        };

        if current.major() < stable.major() {
            UpgradeAdvice::UpgradeAvailable {
                current_major: current.major(),
                stable: stable.name().to_string(),
            }
        } else if current.major() == stable.major() {
            UpgradeAdvice::OnLatestMajor {
                major: current.major(),
            }
        } else {
            UpgradeAdvice::AheadOfStable {
                current_major: current.major(),
                stable_major: stable.major(),
            }
        }
    }
}

impl fmt::Display for UpgradeAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeAdvice::UpgradeAvailable {
                current_major,
                stable,
            } => write!(
                f,
                "Upgrade available: current major {} is behind stable {}",
                current_major, stable
            ),
            UpgradeAdvice::OnLatestMajor { major } => {
                write!(f, "On latest major ({})", major)
            }
            UpgradeAdvice::AheadOfStable {
                current_major,
                stable_major,
            } => write!(
                f,
                "Ahead of stable: current major {} vs stable major {}",
                current_major, stable_major
            ),
            UpgradeAdvice::NoStableTag => {
                write!(f, "No stable tag found to compare against")
            }
            UpgradeAdvice::CurrentUnknown => {
                write!(f, "Current version unknown; no upgrade recommendation")
            }
        }
    }
}
