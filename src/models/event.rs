use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of a hardware address rendered as `AA:BB:CC:DD:EE:FF`
pub const MAC_STRING_LEN: usize = 17;

/// 6-byte hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);
    pub const ZERO: MacAddr = MacAddr([0; 6]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = data.get(..6)?.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Render into a fixed-size, stack-allocated string
    pub fn formatted(&self) -> FormattedMac {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        let mut out = [b':'; MAC_STRING_LEN];
        for (i, byte) in self.0.iter().enumerate() {
            out[i * 3] = HEX[(byte >> 4) as usize];
            out[i * 3 + 1] = HEX[(byte & 0x0f) as usize];
        }
        FormattedMac(out)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.formatted().as_str())
    }
}

/// Error returned when a string is not a colon-separated hardware address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMacError(String);

impl fmt::Display for ParseMacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hardware address '{}'", self.0)
    }
}

impl std::error::Error for ParseMacError {}

impl FromStr for MacAddr {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(|c: char| c == ':' || c == '-');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(|| ParseMacError(s.to_string()))?;
            if part.len() != 2 {
                return Err(ParseMacError(s.to_string()));
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| ParseMacError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(ParseMacError(s.to_string()));
        }
        Ok(Self(bytes))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.formatted().as_str())
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A hardware address pre-rendered as 17 ASCII bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattedMac([u8; MAC_STRING_LEN]);

impl FormattedMac {
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

/// Coarse classification of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameClass {
    Management,
    Data,
    Control,
    /// Deauthentication management subtype
    Deauth,
    /// Disassociation management subtype
    Disassoc,
    Unknown,
}

impl FrameClass {
    /// Deauthentication or disassociation
    pub fn is_deauth(&self) -> bool {
        matches!(self, FrameClass::Deauth | FrameClass::Disassoc)
    }

    /// Whether the frame belongs to the management class (including its subtypes)
    pub fn is_management(&self) -> bool {
        matches!(
            self,
            FrameClass::Management | FrameClass::Deauth | FrameClass::Disassoc
        )
    }
}

/// Summary of one captured frame, produced in the driver's callback context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    /// Transmitter address
    pub source: MacAddr,

    /// Receiver address
    pub target: MacAddr,

    /// Signal strength in dBm, typically -100..0
    pub rssi: i8,

    /// Channel the frame was received on
    pub channel: u8,

    pub frame_class: FrameClass,

    /// Reason code; only present for deauth/disassoc frames
    pub reason_code: Option<u16>,

    /// Monotonic capture time in milliseconds
    pub timestamp_ms: u64,
}

impl CaptureEvent {
    /// A non-deauth frame summary
    pub fn frame(
        source: MacAddr,
        target: MacAddr,
        rssi: i8,
        channel: u8,
        frame_class: FrameClass,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            source,
            target,
            rssi,
            channel,
            frame_class,
            reason_code: None,
            timestamp_ms,
        }
    }

    /// A deauthentication frame summary
    pub fn deauth(source: MacAddr, target: MacAddr, reason_code: u16, timestamp_ms: u64) -> Self {
        Self {
            source,
            target,
            rssi: -60,
            channel: 0,
            frame_class: FrameClass::Deauth,
            reason_code: Some(reason_code),
            timestamp_ms,
        }
    }

    pub fn with_rssi(mut self, rssi: i8) -> Self {
        self.rssi = rssi;
        self
    }

    pub fn is_broadcast_target(&self) -> bool {
        self.target.is_broadcast()
    }
}
