//! Consumer tasks, one per radio mode.
//!
//! Each task is spawned when its mode starts and aborted when it stops. Tasks
//! only touch shared state through [`SharedState`], so an abort can never land
//! in the middle of an update.

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::capture::clock::MonotonicClock;
use crate::capture::queue::{EventConsumer, Received};
use crate::capture::ring::SignalHistoryBuffer;
use crate::capture::shared::{PipelineCounters, SharedState};
use crate::detection::deauth::{DeauthDetector, FlagChange};
use crate::models::config::DeauthPolicy;
use crate::models::event::CaptureEvent;
use crate::models::network::NetworkInfo;
use crate::models::stats::{DeauthStatistics, SignalStatistics};
use crate::radio::{beacon, RadioDriver};

/// State every session reads or writes, owned by the coordinator
#[derive(Clone)]
pub struct SessionShared {
    pub signal: SharedState<SignalStatistics>,
    pub history: SharedState<SignalHistoryBuffer>,
    pub deauth: SharedState<DeauthStatistics>,
    pub recent_deauths: SharedState<Vec<CaptureEvent>>,
    pub networks: SharedState<Vec<NetworkInfo>>,
    pub counters: Arc<PipelineCounters>,
    /// Tuned channel; configuration rather than a counter
    pub channel: Arc<AtomicU8>,
    /// Set by reporters, consumed by the detector task
    pub deauth_reset: Arc<AtomicBool>,
    pub clock: MonotonicClock,
}

impl SessionShared {
    pub fn new(
        channel: u8,
        history_size: usize,
        lock_wait: Duration,
        clock: MonotonicClock,
    ) -> Self {
        Self {
            signal: SharedState::new(SignalStatistics::with_channel(channel), lock_wait),
            history: SharedState::new(SignalHistoryBuffer::new(history_size), lock_wait),
            deauth: SharedState::new(DeauthStatistics::default(), lock_wait),
            recent_deauths: SharedState::new(Vec::new(), lock_wait),
            networks: SharedState::new(Vec::new(), lock_wait),
            counters: Arc::new(PipelineCounters::default()),
            channel: Arc::new(AtomicU8::new(channel)),
            deauth_reset: Arc::new(AtomicBool::new(false)),
            clock,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel.load(Ordering::Relaxed)
    }
}

/// Promiscuous capture: per-class counters and signal history
pub async fn run_sniffer(mut consumer: EventConsumer, shared: SessionShared, poll: Duration) {
    info!("Sniffer consumer started");

    loop {
        match consumer.consume(poll).await {
            Received::Event(event) => {
                record_frame(&shared, &event);
                // drain the rest of a burst before waiting again
                while let Some(event) = consumer.try_consume() {
                    record_frame(&shared, &event);
                }
            }
            Received::Timeout => {
                trace!("Sniffer idle for {:?}", poll);
            }
            Received::Closed => break,
        }
    }

    info!("Sniffer consumer stopped");
}

fn record_frame(shared: &SessionShared, event: &CaptureEvent) {
    let _ = shared
        .counters
        .observe(shared.signal.update(|s| s.record(event)));
    let _ = shared
        .counters
        .observe(shared.history.update(|h| h.push(event.rssi)));
}

/// Deauthentication detection: classify deauth/disassoc events.
///
/// Housekeeping runs once per `poll` whether or not events keep arriving, so
/// idle sources age out even under sustained traffic.
pub async fn run_detector(
    mut consumer: EventConsumer,
    shared: SessionShared,
    policy: DeauthPolicy,
    poll: Duration,
) {
    info!("Deauth detector started");
    let mut detector = DeauthDetector::new(policy);
    let history_len = detector.policy().history_capacity;
    let poll_ms = poll.as_millis() as u64;
    let mut last_housekeeping = shared.clock.now_ms();

    loop {
        let received = consumer.consume(poll).await;
        if shared.deauth_reset.swap(false, Ordering::AcqRel) {
            debug!("Resetting deauth detector state");
            detector.reset();
        }

        let mut recent = None;
        match received {
            Received::Event(event) => {
                let change = detector.observe(&event);
                trace!("Deauth from {} -> {} ({:?})", event.source, event.target, change);

                let _ = shared
                    .counters
                    .observe(shared.signal.update(|s| s.record(&event)));
                recent = Some(detector.recent_events(history_len));
            }
            Received::Timeout => tokio::task::yield_now().await,
            Received::Closed => break,
        }

        let now = shared.clock.now_ms();
        if now.saturating_sub(last_housekeeping) >= poll_ms {
            if detector.housekeeping(now) == FlagChange::Cleared {
                debug!("Attack flag cleared during housekeeping");
            }
            trace!(
                "{} deauth sources tracked, {} in window",
                detector.tracked_sources(),
                detector.window_count()
            );
            last_housekeeping = now;
        }

        publish_detector(&shared, &detector, recent);
    }

    info!("Deauth detector stopped");
}

/// Publish detector output unless a reset is pending.
///
/// A pending reset means readers already see zeroed statistics; writing the
/// pre-reset values back would undo that until the next wake-up.
fn publish_detector(
    shared: &SessionShared,
    detector: &DeauthDetector,
    recent: Option<Vec<CaptureEvent>>,
) -> bool {
    if shared.deauth_reset.load(Ordering::Acquire) {
        trace!("Deauth reset pending; publish withheld");
        return false;
    }

    if let Some(recent) = recent {
        let _ = shared
            .counters
            .observe(shared.recent_deauths.update(|r| *r = recent));
    }
    let stats = detector.statistics();
    let _ = shared
        .counters
        .observe(shared.deauth.update(|s| *s = stats));
    true
}

/// Network scanning: replace the network list once per scan
pub async fn run_scanner(radio: Arc<dyn RadioDriver>, shared: SessionShared, interval: Duration) {
    info!("Scanner started with {:?} interval", interval);

    loop {
        let driver = radio.clone();
        match tokio::task::spawn_blocking(move || driver.list_networks()).await {
            Ok(Ok(networks)) => {
                debug!("Scan found {} networks", networks.len());
                let _ = shared
                    .counters
                    .observe(shared.networks.update(|n| *n = networks));
            }
            Ok(Err(e)) => warn!("Scan failed: {}", e),
            Err(e) => warn!("Scan task failed: {}", e),
        }

        tokio::time::sleep(interval).await;
    }
}

/// Beacon spamming: cycle forged beacons through the SSID list
pub async fn run_spammer(
    radio: Arc<dyn RadioDriver>,
    shared: SessionShared,
    ssids: Vec<String>,
    interval: Duration,
) {
    let ssids = if ssids.is_empty() {
        vec![env!("CARGO_PKG_NAME").to_string()]
    } else {
        ssids
    };
    info!("Beacon spammer started with {} SSIDs", ssids.len());

    let mut rng = StdRng::from_entropy();
    for ssid in ssids.iter().cycle() {
        let source = beacon::random_source(&mut rng);
        let frame = beacon::build_beacon(ssid, source, shared.channel());

        match radio.transmit_frame(&frame) {
            Ok(()) => {
                trace!("Beacon '{}' from {}", ssid, source);
                let _ = shared
                    .counters
                    .observe(shared.signal.update(|s| s.transmitted += 1));
            }
            Err(e) => warn!("Beacon transmit failed: {}", e),
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::queue::{event_queue, FrameFilter};
    use crate::models::event::{FrameClass, MacAddr};
    use parking_lot::Mutex;

    fn shared() -> SessionShared {
        SessionShared::new(6, 8, Duration::from_millis(5), MonotonicClock::new())
    }

    #[tokio::test]
    async fn sniffer_applies_events_in_order() {
        let shared = shared();
        let (producer, consumer) =
            event_queue(16, FrameFilter::All, shared.counters.clone()).unwrap();
        let task = tokio::spawn(run_sniffer(consumer, shared.clone(), Duration::from_millis(5)));

        for (i, rssi) in [-70i8, -60, -50].iter().enumerate() {
            producer.produce(CaptureEvent::frame(
                MacAddr::ZERO,
                MacAddr::BROADCAST,
                *rssi,
                6,
                FrameClass::Data,
                i as u64,
            ));
        }
        drop(producer);
        task.await.unwrap();

        let stats = shared.signal.snapshot();
        assert_eq!(stats.packet_count, 3);
        assert_eq!(stats.data_count, 3);
        assert_eq!(stats.rssi, -50);
        let history = shared.history.read(|h| h.recent(3)).unwrap();
        assert_eq!(history, vec![-70, -60, -50]);
    }

    #[tokio::test]
    async fn detector_publishes_statistics_and_honours_reset() {
        let shared = shared();
        let (producer, consumer) =
            event_queue(32, FrameFilter::DeauthOnly, shared.counters.clone()).unwrap();
        let task = tokio::spawn(run_detector(
            consumer,
            shared.clone(),
            DeauthPolicy::default(),
            Duration::from_millis(5),
        ));

        let attacker = MacAddr::new([0x02, 0, 0, 0, 0, 0xaa]);
        for i in 0..11u64 {
            producer.produce(CaptureEvent::deauth(attacker, MacAddr::BROADCAST, 7, i * 90));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let stats = shared.deauth.snapshot();
        assert_eq!(stats.total_deauths, 11);
        assert!(stats.attack_detected);
        assert_eq!(shared.recent_deauths.snapshot().len(), 11);

        shared.deauth_reset.store(true, Ordering::Release);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(shared.deauth.snapshot(), DeauthStatistics::default());

        drop(producer);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn idle_sources_age_out_under_steady_traffic() {
        let shared = shared();
        let (producer, consumer) =
            event_queue(32, FrameFilter::DeauthOnly, shared.counters.clone()).unwrap();
        let policy = DeauthPolicy {
            tracker_max_age_ms: 300,
            ..DeauthPolicy::default()
        };
        let task = tokio::spawn(run_detector(
            consumer,
            shared.clone(),
            policy,
            Duration::from_millis(100),
        ));

        let quiet_source = MacAddr::new([0x02, 0, 0, 0, 0, 0xaa]);
        let busy_source = MacAddr::new([0x02, 0, 0, 0, 0, 0xbb]);
        let client = MacAddr::new([0x02, 0, 0, 0, 0, 0x01]);
        let deauth = |from| CaptureEvent::deauth(from, client, 7, shared.clock.now_ms());

        for _ in 0..5 {
            producer.produce(deauth(quiet_source));
        }
        // frames every 40 ms keep the 100 ms queue wait from ever timing out
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(40)).await;
            producer.produce(deauth(busy_source));
        }
        producer.produce(deauth(quiet_source));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let stats = shared.deauth.snapshot();
        assert_eq!(stats.total_deauths, 26);
        assert_eq!(stats.suspicious_ap, Some(busy_source));

        drop(producer);
        task.await.unwrap();
    }

    #[test]
    fn pending_reset_withholds_publish() {
        let shared = shared();
        let mut detector = DeauthDetector::default();
        for i in 0..4u64 {
            detector.observe(&CaptureEvent::deauth(MacAddr::ZERO, MacAddr::BROADCAST, 7, i));
        }

        shared.deauth_reset.store(true, Ordering::Release);
        assert!(!publish_detector(&shared, &detector, Some(detector.recent_events(20))));
        assert_eq!(shared.deauth.snapshot(), DeauthStatistics::default());
        assert!(shared.recent_deauths.snapshot().is_empty());

        shared.deauth_reset.store(false, Ordering::Release);
        assert!(publish_detector(&shared, &detector, Some(detector.recent_events(20))));
        assert_eq!(shared.deauth.snapshot().total_deauths, 4);
        assert_eq!(shared.recent_deauths.snapshot().len(), 4);
    }

    #[tokio::test]
    async fn sniffer_drains_bursts_in_order() {
        let shared = shared();
        let (producer, consumer) =
            event_queue(16, FrameFilter::All, shared.counters.clone()).unwrap();
        for rssi in [-80i8, -70, -60, -50, -40] {
            producer.produce(CaptureEvent::frame(
                MacAddr::ZERO,
                MacAddr::BROADCAST,
                rssi,
                6,
                FrameClass::Management,
                0,
            ));
        }
        drop(producer);
        run_sniffer(consumer, shared.clone(), Duration::from_millis(5)).await;

        assert_eq!(shared.signal.snapshot().mgmt_count, 5);
        assert_eq!(
            shared.history.read(|h| h.recent(5)).unwrap(),
            vec![-80, -70, -60, -50, -40]
        );
        assert_eq!(shared.counters.snapshot().processed_events, 5);
    }

    struct CountingRadio {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    impl RadioDriver for CountingRadio {
        fn begin_capture(
            &self,
            _channel: u8,
            _sink: crate::capture::queue::EventProducer,
        ) -> Result<(), crate::utils::error::RadioError> {
            Ok(())
        }
        fn end_capture(&self) -> Result<(), crate::utils::error::RadioError> {
            Ok(())
        }
        fn transmit_frame(&self, frame: &[u8]) -> Result<(), crate::utils::error::RadioError> {
            self.frames.lock().push(frame.to_vec());
            Ok(())
        }
        fn set_channel(&self, _channel: u8) -> Result<(), crate::utils::error::RadioError> {
            Ok(())
        }
        fn list_networks(&self) -> Result<Vec<NetworkInfo>, crate::utils::error::RadioError> {
            Ok(vec![NetworkInfo::new("Lab", MacAddr::ZERO, -40, 6)])
        }
    }

    #[tokio::test]
    async fn spammer_cycles_ssids_and_counts_transmissions() {
        let shared = shared();
        let radio = Arc::new(CountingRadio {
            frames: Mutex::new(Vec::new()),
        });
        let task = tokio::spawn(run_spammer(
            radio.clone(),
            shared.clone(),
            vec!["One".into(), "Two".into()],
            Duration::from_millis(5),
        ));
        tokio::time::sleep(Duration::from_millis(60)).await;
        task.abort();
        let _ = task.await;

        let frames = radio.frames.lock();
        assert!(frames.len() >= 3);
        assert_eq!(beacon::beacon_ssid(&frames[0]).as_deref(), Some("One"));
        assert_eq!(beacon::beacon_ssid(&frames[1]).as_deref(), Some("Two"));
        assert_eq!(beacon::beacon_ssid(&frames[2]).as_deref(), Some("One"));
        assert_eq!(frames[0][frames[0].len() - 1], 6);
        assert_eq!(shared.signal.snapshot().transmitted, frames.len() as u64);
    }

    #[tokio::test]
    async fn scanner_publishes_network_list() {
        let shared = shared();
        let radio = Arc::new(CountingRadio {
            frames: Mutex::new(Vec::new()),
        });
        let task = tokio::spawn(run_scanner(radio, shared.clone(), Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();
        let _ = task.await;

        let networks = shared.networks.snapshot();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].ssid, "Lab");
    }
}
