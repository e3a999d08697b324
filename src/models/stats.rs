use serde::{Deserialize, Serialize};

use crate::models::event::{CaptureEvent, FrameClass, MacAddr};

/// Weakest representable signal; also the fill value for unseen history slots
pub const RSSI_FLOOR: i8 = -100;

/// Live channel and packet counters for the active capture mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalStatistics {
    /// Channel the radio is tuned to
    pub channel: u8,

    /// Signal strength of the most recent frame
    pub rssi: i8,

    /// Total frames seen
    pub packet_count: u64,

    /// Management frames (deauth/disassoc included)
    pub mgmt_count: u64,

    /// Data frames
    pub data_count: u64,

    /// Control frames
    pub ctrl_count: u64,

    /// Deauthentication and disassociation frames
    pub deauth_count: u64,

    /// Frames handed to the radio for transmission
    pub transmitted: u64,

    /// Whether a mode is currently feeding these counters
    pub is_active: bool,
}

impl Default for SignalStatistics {
    fn default() -> Self {
        Self {
            channel: 0,
            rssi: RSSI_FLOOR,
            packet_count: 0,
            mgmt_count: 0,
            data_count: 0,
            ctrl_count: 0,
            deauth_count: 0,
            transmitted: 0,
            is_active: false,
        }
    }
}

impl SignalStatistics {
    pub fn with_channel(channel: u8) -> Self {
        Self {
            channel,
            ..Self::default()
        }
    }

    /// Fold one captured frame into the counters
    pub fn record(&mut self, event: &CaptureEvent) {
        self.packet_count += 1;
        self.rssi = event.rssi;

        if event.frame_class.is_management() {
            self.mgmt_count += 1;
        }
        match event.frame_class {
            FrameClass::Data => self.data_count += 1,
            FrameClass::Control => self.ctrl_count += 1,
            FrameClass::Deauth | FrameClass::Disassoc => self.deauth_count += 1,
            FrameClass::Management | FrameClass::Unknown => {}
        }
    }

    /// Zero every counter, keeping the tuned channel
    pub fn reset_counts(&mut self) {
        *self = Self {
            is_active: self.is_active,
            ..Self::with_channel(self.channel)
        };
    }
}

/// Deauthentication detector output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeauthStatistics {
    /// Deauth and disassoc frames seen this session
    pub total_deauths: u64,

    /// Frames addressed to the broadcast address
    pub broadcast_deauths: u64,

    /// Running tally of suspicious observations
    pub suspicious_count: u64,

    /// Attack flag, with hysteresis on clearing
    pub attack_detected: bool,

    /// Most recent source that crossed the per-source threshold
    pub suspicious_ap: Option<MacAddr>,

    /// Timestamp of the last change of `attack_detected`
    pub last_detection_time_ms: u64,
}

/// Snapshot of the event pipeline's loss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    /// Events consumed by the active mode's task
    pub processed_events: u64,

    /// Events dropped because the queue was full or already destroyed
    pub dropped_events: u64,

    /// Statistics updates skipped on lock contention
    pub skipped_updates: u64,
}
