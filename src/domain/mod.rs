//! Domain logic - pure version/channel rules independent of git operations

pub mod channel;
pub mod version;

pub use channel::{Channel, ClassifiedVersion};
pub use version::VersionTag;
