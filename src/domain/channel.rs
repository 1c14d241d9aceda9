use crate::domain::VersionTag;
use std::fmt;

/// Release-maturity tier inferred for an upstream tag.
///
/// The ordering here is the display order of the channel table
/// (most mature first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Stable,
    Beta,
    Dev,
    Canary,
    Unknown,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Channel::Stable => "Stable",
            Channel::Beta => "Beta",
            Channel::Dev => "Dev",
            Channel::Canary => "Canary",
            Channel::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// A tag together with its classification. Derived once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedVersion {
    pub tag: VersionTag,
    pub major: u32,
    pub channel: Channel,
}

impl ClassifiedVersion {
    pub fn new(tag: VersionTag, channel: Channel) -> Self {
        let major = tag.major();
        ClassifiedVersion {
            tag,
            major,
            channel,
        }
    }
}
