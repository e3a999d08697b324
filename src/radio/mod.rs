//! The radio driver seam.
//!
//! The coordinator never touches hardware directly: capture, transmission,
//! tuning and network listing all go through [`RadioDriver`]. A driver calls
//! [`EventProducer::produce`] from its frame callback, which never blocks.

pub mod beacon;
pub mod simulated;

use crate::capture::queue::EventProducer;
use crate::models::network::NetworkInfo;
use crate::utils::error::RadioError;

pub use simulated::{SimulatedRadio, TrafficProfile};

/// Operations the coordinator needs from the physical radio
pub trait RadioDriver: Send + Sync {
    /// Start promiscuous capture on `channel`, delivering frames to `sink`.
    ///
    /// The driver keeps `sink` until [`RadioDriver::end_capture`].
    fn begin_capture(&self, channel: u8, sink: EventProducer) -> Result<(), RadioError>;

    /// Stop capture and release the sink. Must be safe to call when idle.
    fn end_capture(&self) -> Result<(), RadioError>;

    /// Send one raw frame
    fn transmit_frame(&self, frame: &[u8]) -> Result<(), RadioError>;

    fn set_channel(&self, channel: u8) -> Result<(), RadioError>;

    /// Perform one scan; may block for the duration of the scan
    fn list_networks(&self) -> Result<Vec<NetworkInfo>, RadioError>;

    /// Human-readable driver name for logs
    fn name(&self) -> &str {
        "radio"
    }
}
