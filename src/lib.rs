//! Single-radio wireless monitor.
//!
//! A [`capture::ModeCoordinator`] arbitrates one radio between scanning,
//! sniffing, beacon spamming and deauthentication attack detection, and
//! exposes the resulting statistics to the HTTP API.

pub mod api;
pub mod capture;
pub mod detection;
pub mod models;
pub mod radio;
pub mod utils;
