//! HTTP and WebSocket surface over the coordinator.

pub mod handlers;
pub mod routes;
pub mod websocket;

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::capture::manager::ModeCoordinator;

/// Coordinator handle shared by every handler
pub type SharedCoordinator = Arc<RwLock<ModeCoordinator>>;
