use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::utils::error::{AppError, AppResult};

/// Lowest and highest 2.4 GHz channel the coordinator will tune to
pub const MIN_CHANNEL: u8 = 1;
pub const MAX_CHANNEL: u8 = 14;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Port for the REST API server
    pub port: u16,

    /// Channel tuned at startup
    pub channel: u8,

    /// Number of signal samples kept for history views
    pub history_size: usize,

    /// Event queue capacity for general capture
    pub capture_queue_capacity: usize,

    /// Event queue capacity for deauth detection
    pub deauth_queue_capacity: usize,

    /// Bounded wait of a consumer on its queue before housekeeping
    pub consumer_poll_ms: u64,

    /// Bounded wait for the statistics locks
    pub lock_wait_ms: u64,

    /// Interval between network scans
    pub scan_interval_ms: u64,

    /// Interval between forged beacons
    pub beacon_interval_ms: u64,

    /// Network names announced while spamming
    pub spam_ssids: Vec<String>,

    /// Deauthentication detector thresholds
    pub deauth: DeauthPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            channel: 6,
            history_size: 80,
            capture_queue_capacity: 50,
            deauth_queue_capacity: 30,
            consumer_poll_ms: 100,
            lock_wait_ms: 10,
            scan_interval_ms: 5000,
            beacon_interval_ms: 100,
            spam_ssids: [
                "FreeWiFi",
                "Airport_Guest",
                "Starbucks WiFi",
                "xfinitywifi",
                "HOME-5G",
                "Linksys",
                "NETGEAR42",
                "FBI Surveillance Van",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            deauth: DeauthPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load a JSON configuration file; absent fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no mode could run with
    pub fn validate(&self) -> AppResult<()> {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&self.channel) {
            return Err(AppError::InvalidChannel(self.channel));
        }
        if self.history_size == 0 {
            return Err(AppError::Config("history_size must be at least 1".into()));
        }
        if self.deauth.tracker_capacity == 0 {
            return Err(AppError::Config(
                "deauth.tracker_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn consumer_poll(&self) -> Duration {
        Duration::from_millis(self.consumer_poll_ms)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn beacon_interval(&self) -> Duration {
        Duration::from_millis(self.beacon_interval_ms)
    }
}

/// Thresholds for the deauthentication detector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeauthPolicy {
    /// Width of the flood-counting window
    pub flood_window_ms: u64,

    /// Events in one window above which the attack flag is raised
    pub flood_threshold: u32,

    /// Broadcast-targeted events above which the attack flag is raised
    pub broadcast_threshold: u64,

    /// Events from one source above which it is marked suspicious
    pub source_threshold: u32,

    /// Time since the last triggering event before the flag may clear
    pub quiet_period_ms: u64,

    /// The flag only clears while the window count is below this
    pub clear_below: u32,

    /// Number of sources tracked at once
    pub tracker_capacity: usize,

    /// Idle time after which a tracked source is forgotten
    pub tracker_max_age_ms: u64,

    /// Number of recent events retained for inspection
    pub history_capacity: usize,
}

impl Default for DeauthPolicy {
    fn default() -> Self {
        Self {
            flood_window_ms: 1000,
            flood_threshold: 10,
            broadcast_threshold: 3,
            source_threshold: 5,
            quiet_period_ms: 5000,
            clear_below: 2,
            tracker_capacity: 10,
            tracker_max_age_ms: 10_000,
            history_capacity: 20,
        }
    }
}
