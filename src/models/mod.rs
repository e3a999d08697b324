pub mod config;
pub mod event;
pub mod network;
pub mod state;
pub mod stats;
