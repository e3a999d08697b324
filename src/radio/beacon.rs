//! Forged beacon frames for the spamming mode.

use rand::Rng;

use crate::models::event::MacAddr;
use crate::models::network::MAX_SSID_LEN;

/// MAC header plus fixed beacon parameters
pub const BEACON_HEADER_LEN: usize = 36;

const FRAME_CONTROL_BEACON: [u8; 2] = [0x80, 0x00];
/// 100 TU
const BEACON_INTERVAL: [u8; 2] = [0x64, 0x00];
/// ESS, privacy
const CAPABILITIES: [u8; 2] = [0x11, 0x00];

const TAG_SSID: u8 = 0x00;
const TAG_DS_PARAMETER: u8 = 0x03;

/// A random unicast, locally administered address
pub fn random_source<R: Rng + ?Sized>(rng: &mut R) -> MacAddr {
    let mut bytes: [u8; 6] = rng.gen();
    bytes[0] = (bytes[0] & 0xfe) | 0x02;
    MacAddr::new(bytes)
}

/// Build a beacon announcing `ssid` from `source` on `channel`.
///
/// SSIDs longer than 32 bytes are truncated.
pub fn build_beacon(ssid: &str, source: MacAddr, channel: u8) -> Vec<u8> {
    let ssid = &ssid.as_bytes()[..ssid.len().min(MAX_SSID_LEN)];
    let mut frame = Vec::with_capacity(BEACON_HEADER_LEN + 2 + ssid.len() + 3);

    frame.extend_from_slice(&FRAME_CONTROL_BEACON);
    frame.extend_from_slice(&[0x00, 0x00]); // duration
    frame.extend_from_slice(MacAddr::BROADCAST.as_bytes());
    frame.extend_from_slice(source.as_bytes());
    frame.extend_from_slice(source.as_bytes()); // BSSID
    frame.extend_from_slice(&[0x00, 0x00]); // sequence control
    frame.extend_from_slice(&[0x00; 8]); // timestamp, filled by hardware
    frame.extend_from_slice(&BEACON_INTERVAL);
    frame.extend_from_slice(&CAPABILITIES);

    frame.push(TAG_SSID);
    frame.push(ssid.len() as u8);
    frame.extend_from_slice(ssid);

    frame.push(TAG_DS_PARAMETER);
    frame.push(1);
    frame.push(channel);

    frame
}

/// Extract the SSID element of a beacon, if the frame is one
pub fn beacon_ssid(frame: &[u8]) -> Option<String> {
    if frame.get(..2)? != &FRAME_CONTROL_BEACON[..] {
        return None;
    }
    let tag = *frame.get(BEACON_HEADER_LEN)?;
    let len = *frame.get(BEACON_HEADER_LEN + 1)? as usize;
    if tag != TAG_SSID || len > MAX_SSID_LEN {
        return None;
    }
    let start = BEACON_HEADER_LEN + 2;
    let ssid = frame.get(start..start + len)?;
    Some(String::from_utf8_lossy(ssid).into_owned())
}

/// Source address of a beacon
pub fn beacon_source(frame: &[u8]) -> Option<MacAddr> {
    MacAddr::from_slice(frame.get(10..16)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_beacon_format() {
        let source = MacAddr::new([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let frame = build_beacon("Lobby", source, 11);

        assert_eq!(frame.len(), BEACON_HEADER_LEN + 2 + 5 + 3);
        assert_eq!(&frame[0..2], &[0x80, 0x00]);
        assert_eq!(&frame[4..10], MacAddr::BROADCAST.as_bytes());
        assert_eq!(&frame[10..16], source.as_bytes());
        assert_eq!(&frame[16..22], source.as_bytes());
        assert_eq!(&frame[32..34], &[0x64, 0x00]);
        assert_eq!(frame[36], 0x00);
        assert_eq!(frame[37], 5);
        assert_eq!(&frame[38..43], b"Lobby");
        assert_eq!(&frame[43..46], &[0x03, 0x01, 11]);
    }

    #[test]
    fn long_ssid_is_truncated() {
        let long = "x".repeat(40);
        let frame = build_beacon(&long, MacAddr::ZERO, 1);
        assert_eq!(frame[37] as usize, MAX_SSID_LEN);
        assert_eq!(beacon_ssid(&frame).unwrap().len(), MAX_SSID_LEN);
    }

    #[test]
    fn ssid_and_source_read_back() {
        let source = MacAddr::new([0x06, 1, 2, 3, 4, 5]);
        let frame = build_beacon("Guest", source, 6);
        assert_eq!(beacon_ssid(&frame).as_deref(), Some("Guest"));
        assert_eq!(beacon_source(&frame), Some(source));
        assert_eq!(beacon_ssid(&[0x40, 0x00, 0x00]), None);
        assert_eq!(beacon_ssid(&frame[..37]), None);
    }

    #[test]
    fn random_sources_are_local_unicast() {
        let mut rng = rand::thread_rng();
        for _ in 0..32 {
            let mac = random_source(&mut rng);
            assert_eq!(mac.as_bytes()[0] & 0x01, 0);
            assert_eq!(mac.as_bytes()[0] & 0x02, 0x02);
        }
    }
}
