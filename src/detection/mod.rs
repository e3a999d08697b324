//! Wireless attack detection.

pub mod deauth;
pub mod tracker;

pub use deauth::{DeauthDetector, FlagChange};
pub use tracker::SourceFrequencyTracker;
