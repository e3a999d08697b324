//! Deauthentication/Disassociation Flood Detection
//!
//! Classifies a stream of deauth/disassoc events into background noise or an
//! active attack. Three signals feed the attack flag:
//!
//! - a flood counter over a window anchored at the first event after the
//!   previous window expired,
//! - the session's count of broadcast-targeted frames,
//! - per-source frequency, which marks the offending transmitter.
//!
//! The flag is raised immediately but clears only after a quiet period with
//! the flood counter below a low-water mark.

use log::{debug, info, warn};

use crate::capture::ring::RingBuffer;
use crate::detection::tracker::{Observation, SourceFrequencyTracker};
use crate::models::config::DeauthPolicy;
use crate::models::event::CaptureEvent;
use crate::models::stats::DeauthStatistics;

/// Change of the attack flag caused by an event or housekeeping pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagChange {
    Raised,
    Cleared,
    Unchanged,
}

/// Deauth/disassoc flood detector
#[derive(Debug, Clone)]
pub struct DeauthDetector {
    policy: DeauthPolicy,
    stats: DeauthStatistics,
    history: RingBuffer<Option<CaptureEvent>>,
    tracker: SourceFrequencyTracker,
    /// Start of the current flood window
    window_start_ms: Option<u64>,
    /// Events counted in the current window
    window_count: u32,
    /// Timestamp of the last event that satisfied the raise condition
    last_trigger_ms: u64,
}

impl DeauthDetector {
    pub fn new(policy: DeauthPolicy) -> Self {
        Self {
            history: RingBuffer::filled(policy.history_capacity, None),
            tracker: SourceFrequencyTracker::new(policy.tracker_capacity),
            stats: DeauthStatistics::default(),
            window_start_ms: None,
            window_count: 0,
            last_trigger_ms: 0,
            policy,
        }
    }

    pub fn policy(&self) -> &DeauthPolicy {
        &self.policy
    }

    /// Current classification and counters
    pub fn statistics(&self) -> DeauthStatistics {
        self.stats.clone()
    }

    pub fn attack_detected(&self) -> bool {
        self.stats.attack_detected
    }

    /// Events counted in the current flood window
    pub fn window_count(&self) -> u32 {
        self.window_count
    }

    pub fn tracked_sources(&self) -> usize {
        self.tracker.active()
    }

    /// Up to `max` most recent events, oldest first
    pub fn recent_events(&self, max: usize) -> Vec<CaptureEvent> {
        self.history.last(max).into_iter().flatten().collect()
    }

    /// Fold one deauth/disassoc event into the detector
    pub fn observe(&mut self, event: &CaptureEvent) -> FlagChange {
        let now = event.timestamp_ms;

        self.stats.total_deauths += 1;

        if event.is_broadcast_target() {
            self.stats.broadcast_deauths += 1;
            self.stats.suspicious_count += 1;
        }

        self.history.push(Some(*event));

        match self.window_start_ms {
            Some(start) if now.saturating_sub(start) <= self.policy.flood_window_ms => {
                self.window_count = self.window_count.saturating_add(1);
            }
            _ => {
                self.window_start_ms = Some(now);
                self.window_count = 1;
            }
        }

        let source_count = match self.tracker.observe(event.source, now) {
            Observation::Seen(count) => Some(count),
            Observation::Inserted => Some(1),
            Observation::Untracked => None,
        };
        if let Some(count) = source_count {
            if count > self.policy.source_threshold {
                if self.stats.suspicious_ap != Some(event.source) {
                    warn!(
                        "Source {} exceeded {} deauth frames",
                        event.source, self.policy.source_threshold
                    );
                }
                self.stats.suspicious_ap = Some(event.source);
                self.stats.suspicious_count += 1;
            }
        }

        let flooding = self.window_count > self.policy.flood_threshold;
        let broadcast_storm = self.stats.broadcast_deauths > self.policy.broadcast_threshold;

        if flooding || broadcast_storm {
            self.last_trigger_ms = now;
            if !self.stats.attack_detected {
                self.stats.attack_detected = true;
                self.stats.last_detection_time_ms = now;
                warn!(
                    "Deauthentication attack detected: {} in window, {} broadcast, source {}",
                    self.window_count, self.stats.broadcast_deauths, event.source
                );
                return FlagChange::Raised;
            }
            return FlagChange::Unchanged;
        }

        self.try_clear(now)
    }

    /// Periodic maintenance, run on a fixed cadence whether or not events arrive
    pub fn housekeeping(&mut self, now_ms: u64) -> FlagChange {
        let freed = self.tracker.expire(now_ms, self.policy.tracker_max_age_ms);
        if freed > 0 {
            debug!("Aged out {} idle deauth sources", freed);
        }

        if let Some(start) = self.window_start_ms {
            if now_ms.saturating_sub(start) > self.policy.flood_window_ms {
                self.window_start_ms = None;
                self.window_count = 0;
            }
        }

        self.try_clear(now_ms)
    }

    /// Return to the freshly started state
    pub fn reset(&mut self) {
        *self = Self::new(self.policy.clone());
    }

    fn try_clear(&mut self, now_ms: u64) -> FlagChange {
        if !self.stats.attack_detected {
            return FlagChange::Unchanged;
        }

        let quiet = now_ms.saturating_sub(self.last_trigger_ms) >= self.policy.quiet_period_ms;
        if quiet && self.window_count < self.policy.clear_below {
            self.stats.attack_detected = false;
            self.stats.last_detection_time_ms = now_ms;
            info!(
                "Deauthentication attack cleared after {} ms of quiet",
                now_ms.saturating_sub(self.last_trigger_ms)
            );
            return FlagChange::Cleared;
        }

        FlagChange::Unchanged
    }
}

impl Default for DeauthDetector {
    fn default() -> Self {
        Self::new(DeauthPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::MacAddr;

    const AP_A: MacAddr = MacAddr::new([0xa0, 0, 0, 0, 0, 0x0a]);
    const CLIENT: MacAddr = MacAddr::new([0xc0, 0, 0, 0, 0, 0x01]);

    fn source(n: u8) -> MacAddr {
        MacAddr::new([0x02, 0, 0, 0, 0, n])
    }

    #[test]
    fn broadcast_burst_from_one_source_is_an_attack() {
        let mut detector = DeauthDetector::default();
        for i in 0..11u64 {
            detector.observe(&CaptureEvent::deauth(AP_A, MacAddr::BROADCAST, 7, i * 90));
        }

        let stats = detector.statistics();
        assert_eq!(stats.total_deauths, 11);
        assert_eq!(stats.broadcast_deauths, 11);
        assert!(stats.attack_detected);
        assert_eq!(stats.suspicious_ap, Some(AP_A));
        // 11 broadcast + 6 events beyond the per-source threshold
        assert_eq!(stats.suspicious_count, 17);
    }

    #[test]
    fn flood_raises_then_quiet_period_clears() {
        let mut detector = DeauthDetector::default();
        let mut changes = Vec::new();
        for i in 0..11u8 {
            let event = CaptureEvent::deauth(source(i), CLIENT, 1, i as u64 * 50);
            changes.push(detector.observe(&event));
        }

        assert_eq!(changes[10], FlagChange::Raised);
        assert!(changes[..10].iter().all(|c| *c == FlagChange::Unchanged));
        assert!(detector.attack_detected());
        assert_eq!(detector.statistics().last_detection_time_ms, 500);

        // not quiet long enough yet
        assert_eq!(detector.housekeeping(3_000), FlagChange::Unchanged);
        assert!(detector.attack_detected());

        assert_eq!(detector.housekeeping(500 + 5_001), FlagChange::Cleared);
        let stats = detector.statistics();
        assert!(!stats.attack_detected);
        assert_eq!(stats.last_detection_time_ms, 5_501);
    }

    #[test]
    fn ten_events_per_window_is_not_a_flood() {
        let mut detector = DeauthDetector::default();
        for i in 0..10u8 {
            detector.observe(&CaptureEvent::deauth(source(i), CLIENT, 1, i as u64 * 10));
        }
        assert!(!detector.attack_detected());
        assert_eq!(detector.window_count(), 10);
    }

    #[test]
    fn window_resets_when_events_are_spread_out() {
        let mut detector = DeauthDetector::default();
        for i in 0..30u8 {
            detector.observe(&CaptureEvent::deauth(source(i % 5), CLIENT, 1, i as u64 * 400));
        }
        assert!(detector.window_count() <= 3);
        assert!(!detector.attack_detected());
    }

    #[test]
    fn broadcast_frames_always_count_as_suspicious() {
        let mut detector = DeauthDetector::default();
        for i in 0..3u8 {
            detector.observe(&CaptureEvent::deauth(source(i), MacAddr::BROADCAST, 7, i as u64 * 2_000));
        }
        let stats = detector.statistics();
        assert_eq!(stats.broadcast_deauths, 3);
        assert_eq!(stats.suspicious_count, 3);
        assert_eq!(stats.suspicious_ap, None);
        assert!(!stats.attack_detected);

        detector.observe(&CaptureEvent::deauth(source(9), MacAddr::BROADCAST, 7, 8_000));
        assert!(detector.attack_detected());
    }

    #[test]
    fn persistent_source_is_flagged_and_tally_grows() {
        let mut detector = DeauthDetector::default();
        let mut tallies = Vec::new();
        for i in 0..8u64 {
            detector.observe(&CaptureEvent::deauth(AP_A, CLIENT, 3, i * 1_500));
            tallies.push(detector.statistics().suspicious_count);
        }

        assert_eq!(detector.statistics().suspicious_ap, Some(AP_A));
        assert!(tallies.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(tallies[4], 0);
        assert_eq!(tallies[5], 1);
        assert_eq!(tallies[7], 3);
        assert!(!detector.attack_detected());
    }

    #[test]
    fn idle_sources_age_out_before_reaching_threshold() {
        let mut detector = DeauthDetector::default();
        for i in 0..5u64 {
            detector.observe(&CaptureEvent::deauth(AP_A, CLIENT, 3, i * 100));
        }
        assert_eq!(detector.tracked_sources(), 1);

        detector.housekeeping(400 + 10_001);
        assert_eq!(detector.tracked_sources(), 0);

        detector.observe(&CaptureEvent::deauth(AP_A, CLIENT, 3, 20_000));
        assert_eq!(detector.statistics().suspicious_ap, None);
    }

    #[test]
    fn flag_stays_up_while_triggering_events_continue() {
        let mut detector = DeauthDetector::default();
        for i in 0..4u64 {
            detector.observe(&CaptureEvent::deauth(AP_A, MacAddr::BROADCAST, 7, i));
        }
        assert!(detector.attack_detected());

        // each broadcast event keeps refreshing the trigger time
        for t in [3_000u64, 6_000, 9_000] {
            detector.observe(&CaptureEvent::deauth(AP_A, MacAddr::BROADCAST, 7, t));
            assert_eq!(detector.housekeeping(t + 4_000), FlagChange::Unchanged);
        }
        assert_eq!(detector.housekeeping(9_000 + 5_000), FlagChange::Cleared);
    }

    #[test]
    fn history_keeps_most_recent_events() {
        let policy = DeauthPolicy {
            history_capacity: 4,
            ..DeauthPolicy::default()
        };
        let mut detector = DeauthDetector::new(policy);
        assert!(detector.recent_events(4).is_empty());

        for t in 0..6u64 {
            detector.observe(&CaptureEvent::deauth(source(t as u8), CLIENT, 1, t * 2_000));
        }
        let recent: Vec<u64> = detector.recent_events(10).iter().map(|e| e.timestamp_ms).collect();
        assert_eq!(recent, vec![4_000, 6_000, 8_000, 10_000]);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut detector = DeauthDetector::default();
        for i in 0..12u64 {
            detector.observe(&CaptureEvent::deauth(AP_A, MacAddr::BROADCAST, 7, i));
        }
        detector.reset();
        assert_eq!(detector.statistics(), DeauthStatistics::default());
        assert_eq!(detector.window_count(), 0);
        assert_eq!(detector.tracked_sources(), 0);
        assert!(detector.recent_events(20).is_empty());
    }

    #[test]
    fn custom_policy_thresholds_apply() {
        let policy = DeauthPolicy {
            flood_threshold: 2,
            broadcast_threshold: 100,
            ..DeauthPolicy::default()
        };
        let mut detector = DeauthDetector::new(policy);
        detector.observe(&CaptureEvent::deauth(source(1), CLIENT, 1, 0));
        detector.observe(&CaptureEvent::deauth(source(2), CLIENT, 1, 10));
        assert!(!detector.attack_detected());
        assert_eq!(
            detector.observe(&CaptureEvent::deauth(source(3), CLIENT, 1, 20)),
            FlagChange::Raised
        );
    }
}
