//! Classification engine for assigning release channels to upstream tags

pub mod channel_classifier;

pub use channel_classifier::{ChannelClassifier, ChannelPolicy};
