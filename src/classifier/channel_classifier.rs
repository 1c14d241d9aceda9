use crate::domain::{Channel, ClassifiedVersion, VersionTag};
use crate::error::{PatchCheckError, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// Tags must look like 3 or 4 dotted integers before parsing is attempted
const VERSION_SHAPE: &str = r"^\d+(\.\d+){2,3}$";

/// Tunable thresholds for the channel heuristic.
///
/// The classification is inferred purely from tag shape, not from upstream
/// release metadata; it is a best-effort policy, not ground truth. Keeping
/// the boundary here rather than inlined lets integrators with different
/// tagging conventions replace it, and a metadata-backed classifier should
/// be preferred wherever the hosting service exposes channels directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPolicy {
    /// 4-component tags with a 4th component at or above this value are
    /// treated as Stable; below it, Beta. Long-lived stable branches
    /// accumulate high patch counts.
    pub stable_patch_threshold: u32,
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        ChannelPolicy {
            stable_patch_threshold: 100,
        }
    }
}

/// Assigns release channels to tags and computes per-channel/per-major maxima
pub struct ChannelClassifier {
    policy: ChannelPolicy,
    shape: Regex,
}

impl ChannelClassifier {
    /// Create a classifier with the given policy
    pub fn new(policy: ChannelPolicy) -> Result<Self> {
        let shape = Regex::new(VERSION_SHAPE)
            .map_err(|e| PatchCheckError::parse(format!("Invalid tag shape pattern: {}", e)))?;

        Ok(ChannelClassifier { policy, shape })
    }

    /// Create a classifier with the default policy
    pub fn with_defaults() -> Result<Self> {
        Self::new(ChannelPolicy::default())
    }

    /// Filter raw tag strings down to parseable version tags.
    ///
    /// Upstream repositories carry plenty of tags that are not releases;
    /// those are skipped, never errors.
    pub fn version_tags(&self, raw: &[String]) -> Vec<VersionTag> {
        raw.iter()
            .filter(|tag| self.shape.is_match(tag))
            .filter_map(|tag| VersionTag::parse(tag).ok())
            .collect()
    }

    /// The highest major version across the given tags
    pub fn highest_major(tags: &[VersionTag]) -> Option<u32> {
        tags.iter().map(|t| t.major()).max()
    }

    /// Assign a channel to one tag.
    ///
    /// Precedence: a 4th component at or above the policy threshold marks a
    /// long-lived stable branch; otherwise any tag of the newest major
    /// generation is Canary; what remains splits Beta/Dev on shape.
    pub fn classify(&self, tag: &VersionTag, highest_major: u32) -> ClassifiedVersion {
        let channel = match tag.component_count() {
            3 | 4 => {
                let stable = tag
                    .fourth()
                    .map_or(false, |patch| patch >= self.policy.stable_patch_threshold);

                if stable {
                    Channel::Stable
                } else if tag.major() >= highest_major {
                    Channel::Canary
                } else if tag.component_count() == 4 {
                    Channel::Beta
                } else {
                    Channel::Dev
                }
            }
            _ => Channel::Unknown,
        };

        ClassifiedVersion::new(tag.clone(), channel)
    }

    /// Classify every tag, deriving the highest major from the set itself
    pub fn classify_all(&self, tags: &[VersionTag]) -> Vec<ClassifiedVersion> {
        let highest = Self::highest_major(tags).unwrap_or(0);
        tags.iter().map(|t| self.classify(t, highest)).collect()
    }

    /// The latest tag for a given major version, under numeric ordering
    pub fn latest_per_major<'a>(
        &self,
        tags: &'a [VersionTag],
        major: u32,
    ) -> Option<&'a VersionTag> {
        tags.iter().filter(|t| t.major() == major).max()
    }

    /// The latest tag per channel, under numeric ordering
    pub fn latest_per_channel(
        &self,
        classified: &[ClassifiedVersion],
    ) -> BTreeMap<Channel, VersionTag> {
        let mut latest: BTreeMap<Channel, VersionTag> = BTreeMap::new();

        for entry in classified {
            match latest.get(&entry.channel) {
                Some(current) if *current >= entry.tag => {}
                _ => {
                    latest.insert(entry.channel, entry.tag.clone());
                }
            }
        }

        latest
    }
}
