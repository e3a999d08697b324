//! Radio ownership and the event pipeline behind it.

pub mod clock;
pub mod manager;
pub mod queue;
pub mod ring;
pub mod sessions;
pub mod shared;

pub use manager::{ModeCoordinator, SessionInfo, StatusReport};
