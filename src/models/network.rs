use serde::{Deserialize, Serialize};

use crate::models::event::MacAddr;

/// Longest SSID an access point may announce
pub const MAX_SSID_LEN: usize = 32;

/// Authentication scheme advertised by a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encryption {
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    Wpa3Psk,
    Enterprise,
    Unknown,
}

/// One network reported by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Announced network name (may be empty for hidden networks)
    pub ssid: String,

    /// Access point hardware address
    pub bssid: MacAddr,

    /// Signal strength in dBm
    pub rssi: i8,

    pub channel: u8,

    pub encryption: Encryption,
}

impl NetworkInfo {
    pub fn new(ssid: impl Into<String>, bssid: MacAddr, rssi: i8, channel: u8) -> Self {
        Self {
            ssid: ssid.into(),
            bssid,
            rssi,
            channel,
            encryption: Encryption::Unknown,
        }
    }

    /// Set the encryption type
    pub fn with_encryption(mut self, encryption: Encryption) -> Self {
        self.encryption = encryption;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.ssid.is_empty()
    }

    /// Get a display name that substitutes a placeholder for hidden networks
    pub fn display_name(&self) -> String {
        if self.is_hidden() {
            format!("<hidden {}>", self.bssid)
        } else {
            self.ssid.clone()
        }
    }
}
