//! Software radio that fabricates traffic.
//!
//! Frames are produced on a dedicated OS thread, standing in for the
//! driver's interrupt context: the thread only ever calls the non-blocking
//! [`EventProducer::produce`].

use log::{debug, info};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::capture::clock::MonotonicClock;
use crate::capture::queue::EventProducer;
use crate::models::config::{MAX_CHANNEL, MIN_CHANNEL};
use crate::models::event::{CaptureEvent, FrameClass, MacAddr};
use crate::models::network::{Encryption, NetworkInfo};
use crate::radio::beacon;
use crate::radio::RadioDriver;
use crate::utils::error::RadioError;

/// How many announced SSIDs the radio remembers for scan results
const ANNOUNCED_LIMIT: usize = 16;

/// Shape of the fabricated traffic
#[derive(Debug, Clone)]
pub struct TrafficProfile {
    /// Background frames per second
    pub frames_per_second: u32,

    /// Period between deauth bursts; zero disables bursts
    pub deauth_burst_every_ms: u64,

    /// Frames per deauth burst
    pub deauth_burst_len: u32,

    /// Number of distinct stations producing background traffic
    pub stations: u8,
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self {
            frames_per_second: 200,
            deauth_burst_every_ms: 15_000,
            deauth_burst_len: 25,
            stations: 8,
        }
    }
}

impl TrafficProfile {
    /// Background traffic only
    pub fn quiet() -> Self {
        Self {
            deauth_burst_every_ms: 0,
            ..Self::default()
        }
    }
}

struct CaptureThread {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// A [`RadioDriver`] backed by random traffic
pub struct SimulatedRadio {
    clock: MonotonicClock,
    profile: TrafficProfile,
    channel: Arc<AtomicU8>,
    capture: Mutex<Option<CaptureThread>>,
    transmitted: AtomicU64,
    announced: Mutex<VecDeque<(String, MacAddr)>>,
}

impl SimulatedRadio {
    pub fn new(clock: MonotonicClock, profile: TrafficProfile) -> Self {
        Self {
            clock,
            profile,
            channel: Arc::new(AtomicU8::new(MIN_CHANNEL)),
            capture: Mutex::new(None),
            transmitted: AtomicU64::new(0),
            announced: Mutex::new(VecDeque::new()),
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel.load(Ordering::Relaxed)
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.lock().is_some()
    }

    /// Frames accepted by [`RadioDriver::transmit_frame`]
    pub fn transmitted(&self) -> u64 {
        self.transmitted.load(Ordering::Relaxed)
    }

    fn run_capture(
        sink: EventProducer,
        running: Arc<AtomicBool>,
        channel: Arc<AtomicU8>,
        clock: MonotonicClock,
        profile: TrafficProfile,
    ) {
        let mut rng = rand::thread_rng();
        let stations: Vec<MacAddr> = (0..profile.stations.max(1))
            .map(|_| beacon::random_source(&mut rng))
            .collect();
        let attacker = beacon::random_source(&mut rng);

        let tick = Duration::from_millis(10);
        let per_tick = (profile.frames_per_second / 100).max(1);
        let mut base_rssi: i32 = -60;
        let mut last_burst = clock.now_ms();

        while running.load(Ordering::Relaxed) && !sink.is_closed() {
            let now = clock.now_ms();
            let ch = channel.load(Ordering::Relaxed);

            base_rssi = (base_rssi + rng.gen_range(-2..=2)).clamp(-90, -30);

            for _ in 0..per_tick {
                let class = match rng.gen_range(0..10) {
                    0..=5 => FrameClass::Data,
                    6..=8 => FrameClass::Management,
                    _ => FrameClass::Control,
                };
                let source = stations.choose(&mut rng).copied().unwrap_or(MacAddr::ZERO);
                let target = stations.choose(&mut rng).copied().unwrap_or(MacAddr::BROADCAST);
                let rssi = (base_rssi + rng.gen_range(-5..=5)).clamp(-100, 0) as i8;
                sink.produce(CaptureEvent::frame(source, target, rssi, ch, class, now));
            }

            if profile.deauth_burst_every_ms > 0
                && now.saturating_sub(last_burst) >= profile.deauth_burst_every_ms
            {
                debug!("Injecting {} deauth frames", profile.deauth_burst_len);
                for _ in 0..profile.deauth_burst_len {
                    let mut event = CaptureEvent::deauth(attacker, MacAddr::BROADCAST, 7, now)
                        .with_rssi(rng.gen_range(-55..=-35));
                    event.channel = ch;
                    sink.produce(event);
                }
                last_burst = now;
            }

            thread::sleep(tick);
        }
    }
}

impl RadioDriver for SimulatedRadio {
    fn begin_capture(&self, channel: u8, sink: EventProducer) -> Result<(), RadioError> {
        let mut capture = self.capture.lock();
        if capture.is_some() {
            return Err(RadioError::Busy("capture already running".into()));
        }
        self.set_channel(channel)?;

        let running = Arc::new(AtomicBool::new(true));
        let handle = {
            let running = running.clone();
            let channel = self.channel.clone();
            let clock = self.clock;
            let profile = self.profile.clone();
            thread::Builder::new()
                .name("sim-radio-rx".into())
                .spawn(move || Self::run_capture(sink, running, channel, clock, profile))
                .map_err(|e| RadioError::Unavailable(e.to_string()))?
        };

        info!("Simulated capture started on channel {}", channel);
        *capture = Some(CaptureThread { running, handle });
        Ok(())
    }

    fn end_capture(&self) -> Result<(), RadioError> {
        let Some(thread) = self.capture.lock().take() else {
            return Ok(());
        };
        thread.running.store(false, Ordering::Relaxed);
        thread
            .handle
            .join()
            .map_err(|_| RadioError::Unavailable("capture thread panicked".into()))?;
        info!("Simulated capture stopped");
        Ok(())
    }

    fn transmit_frame(&self, frame: &[u8]) -> Result<(), RadioError> {
        if frame.is_empty() {
            return Err(RadioError::Transmit("empty frame".into()));
        }
        self.transmitted.fetch_add(1, Ordering::Relaxed);

        if let (Some(ssid), Some(source)) = (beacon::beacon_ssid(frame), beacon::beacon_source(frame)) {
            let mut announced = self.announced.lock();
            announced.retain(|(s, _)| *s != ssid);
            announced.push_back((ssid, source));
            while announced.len() > ANNOUNCED_LIMIT {
                announced.pop_front();
            }
        }
        Ok(())
    }

    fn set_channel(&self, channel: u8) -> Result<(), RadioError> {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
            return Err(RadioError::InvalidChannel(channel));
        }
        self.channel.store(channel, Ordering::Relaxed);
        Ok(())
    }

    fn list_networks(&self) -> Result<Vec<NetworkInfo>, RadioError> {
        let mut rng = rand::thread_rng();
        let mut networks = vec![
            NetworkInfo::new("HomeNet", MacAddr::new([0x3c, 0x84, 0x6a, 0x10, 0x20, 0x30]), -48, 6)
                .with_encryption(Encryption::Wpa2Psk),
            NetworkInfo::new("CafeGuest", MacAddr::new([0x00, 0x1d, 0x7e, 0x41, 0x52, 0x63]), -67, 1)
                .with_encryption(Encryption::Open),
            NetworkInfo::new("Office-Corp", MacAddr::new([0xf0, 0x9f, 0xc2, 0x0a, 0x0b, 0x0c]), -74, 11)
                .with_encryption(Encryption::Enterprise),
            NetworkInfo::new("", MacAddr::new([0x62, 0x45, 0xb1, 0x00, 0x00, 0x01]), -81, 6)
                .with_encryption(Encryption::Wpa3Psk),
        ];
        for network in networks.iter_mut() {
            network.rssi = (network.rssi as i32 + rng.gen_range(-3..=3)).clamp(-100, 0) as i8;
        }

        let channel = self.channel();
        networks.extend(self.announced.lock().iter().map(|(ssid, source)| {
            NetworkInfo::new(ssid.clone(), *source, rng.gen_range(-60..=-40), channel)
                .with_encryption(Encryption::Open)
        }));

        Ok(networks)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

impl Drop for SimulatedRadio {
    fn drop(&mut self) {
        let _ = self.end_capture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::queue::{event_queue, FrameFilter, Received};
    use crate::capture::shared::PipelineCounters;

    fn radio(profile: TrafficProfile) -> SimulatedRadio {
        SimulatedRadio::new(MonotonicClock::new(), profile)
    }

    #[tokio::test]
    async fn capture_delivers_frames_until_stopped() {
        let radio = radio(TrafficProfile::quiet());
        let counters = Arc::new(PipelineCounters::default());
        let (producer, mut consumer) = event_queue(64, FrameFilter::All, counters).unwrap();

        radio.begin_capture(3, producer).unwrap();
        assert!(radio.is_capturing());

        match consumer.consume(Duration::from_millis(500)).await {
            Received::Event(event) => assert_eq!(event.channel, 3),
            other => panic!("expected an event, got {:?}", other),
        }

        radio.end_capture().unwrap();
        assert!(!radio.is_capturing());

        // the sink was released with the thread, so the queue drains then closes
        while let Received::Event(_) = consumer.consume(Duration::from_millis(50)).await {}
        assert_eq!(consumer.consume(Duration::from_millis(50)).await, Received::Closed);
    }

    #[test]
    fn capture_thread_exits_once_the_queue_is_gone() {
        let radio = radio(TrafficProfile::quiet());
        let counters = Arc::new(PipelineCounters::default());
        let (producer, consumer) = event_queue(8, FrameFilter::All, counters).unwrap();

        radio.begin_capture(1, producer).unwrap();
        drop(consumer);

        let finished = (0..50).any(|_| {
            thread::sleep(Duration::from_millis(10));
            radio
                .capture
                .lock()
                .as_ref()
                .map_or(true, |t| t.handle.is_finished())
        });
        assert!(finished);
        radio.end_capture().unwrap();
        assert!(!radio.is_capturing());
    }

    #[test]
    fn second_capture_is_busy_and_end_is_idempotent() {
        let radio = radio(TrafficProfile::quiet());
        let counters = Arc::new(PipelineCounters::default());
        let (a, _rx_a) = event_queue(8, FrameFilter::All, counters.clone()).unwrap();
        let (b, _rx_b) = event_queue(8, FrameFilter::All, counters).unwrap();

        radio.begin_capture(6, a).unwrap();
        assert!(matches!(radio.begin_capture(6, b), Err(RadioError::Busy(_))));

        radio.end_capture().unwrap();
        radio.end_capture().unwrap();
    }

    #[test]
    fn rejects_out_of_range_channels() {
        let radio = radio(TrafficProfile::quiet());
        assert_eq!(radio.set_channel(0), Err(RadioError::InvalidChannel(0)));
        assert_eq!(radio.set_channel(15), Err(RadioError::InvalidChannel(15)));
        radio.set_channel(13).unwrap();
        assert_eq!(radio.channel(), 13);
    }

    #[test]
    fn transmitted_beacons_show_up_in_scans() {
        let radio = radio(TrafficProfile::quiet());
        let source = MacAddr::new([0x02, 9, 9, 9, 9, 9]);
        radio.transmit_frame(&beacon::build_beacon("Totally Legit", source, 6)).unwrap();
        radio.transmit_frame(&beacon::build_beacon("Totally Legit", source, 6)).unwrap();

        assert_eq!(radio.transmitted(), 2);
        let networks = radio.list_networks().unwrap();
        let spammed: Vec<_> = networks.iter().filter(|n| n.ssid == "Totally Legit").collect();
        assert_eq!(spammed.len(), 1);
        assert_eq!(spammed[0].bssid, source);

        assert!(matches!(radio.transmit_frame(&[]), Err(RadioError::Transmit(_))));
    }
}
