use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::capture::clock::MonotonicClock;
use crate::capture::queue::{event_queue, FrameFilter};
use crate::capture::sessions::{self, SessionShared};
use crate::models::config::{AppConfig, MAX_CHANNEL, MIN_CHANNEL};
use crate::models::event::CaptureEvent;
use crate::models::network::NetworkInfo;
use crate::models::state::{ModuleState, RadioMode};
use crate::models::stats::{DeauthStatistics, PipelineSnapshot, SignalStatistics, RSSI_FLOOR};
use crate::radio::RadioDriver;
use crate::utils::error::{AppError, AppResult};

/// Identity of the running mode
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub mode: RadioMode,
    pub started_at: DateTime<Utc>,
}

/// Coordinator status for reporting surfaces
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: ModuleState,
    pub channel: u8,
    pub radio: String,
    pub session: Option<SessionInfo>,
}

struct ActiveSession {
    info: SessionInfo,
    task: JoinHandle<()>,
}

/// Arbitrates the single radio between the operating modes.
///
/// At most one mode owns the radio. Starting a mode while another is active
/// tears the old one down completely before anything is acquired for the new
/// one. Reporting accessors never block on the consumer tasks.
pub struct ModeCoordinator {
    /// Application configuration
    config: AppConfig,

    radio: Arc<dyn RadioDriver>,

    state: ModuleState,

    /// Running consumer task, if any
    session: Option<ActiveSession>,

    /// Statistics and buffers shared with the consumer tasks
    shared: SessionShared,
}

impl ModeCoordinator {
    pub fn new(config: AppConfig, radio: Arc<dyn RadioDriver>) -> Self {
        Self::with_clock(config, radio, MonotonicClock::new())
    }

    /// Build a coordinator whose detector timestamps come from `clock`
    pub fn with_clock(config: AppConfig, radio: Arc<dyn RadioDriver>, clock: MonotonicClock) -> Self {
        let shared = SessionShared::new(
            config.channel,
            config.history_size,
            config.lock_wait(),
            clock,
        );
        Self {
            config,
            radio,
            state: ModuleState::Idle,
            session: None,
            shared,
        }
    }

    /// Start `mode`, stopping whatever mode currently owns the radio.
    ///
    /// Starting the mode that is already active is a no-op. When any step of
    /// acquisition fails the coordinator enters [`ModuleState::Error`] and
    /// refuses further starts until it is stopped.
    pub async fn start_mode(&mut self, mode: RadioMode) -> AppResult<ModuleState> {
        let target = ModuleState::from(mode);
        if self.state == target {
            debug!("Mode {} already active", mode);
            return Ok(self.state);
        }
        if self.state == ModuleState::Error {
            return Err(AppError::Faulted(self.state));
        }

        if let Some(current) = self.state.mode() {
            info!("Switching radio from {} to {}", current, mode);
            self.teardown().await;
        }

        match self.acquire(mode) {
            Ok(task) => {
                let info = SessionInfo {
                    id: Uuid::new_v4(),
                    mode,
                    started_at: Utc::now(),
                };
                info!("Started {} (session {})", mode, info.id);
                self.session = Some(ActiveSession { info, task });
                self.state = target;
                Ok(self.state)
            }
            Err(e) => {
                error!("Failed to start {}: {}", mode, e);
                let _ = self
                    .shared
                    .counters
                    .observe(self.shared.signal.update(|s| s.is_active = false));
                self.state = ModuleState::Error;
                Err(e)
            }
        }
    }

    /// Stop `mode` if it is the active one; otherwise nothing happens.
    ///
    /// In the error state any stop releases the radio and returns to idle.
    pub async fn stop_mode(&mut self, mode: RadioMode) -> ModuleState {
        if self.state == ModuleState::Error {
            self.teardown().await;
            return self.state;
        }
        if self.state != ModuleState::from(mode) {
            debug!("Stop {} ignored in state {}", mode, self.state);
            return self.state;
        }
        self.teardown().await;
        self.state
    }

    /// Stop whatever is running, recovering from the error state
    pub async fn stop_all(&mut self) -> ModuleState {
        if self.state != ModuleState::Idle {
            self.teardown().await;
        }
        self.state
    }

    /// Allocate the queue and task for `mode` and hand the radio its sink
    fn acquire(&self, mode: RadioMode) -> AppResult<JoinHandle<()>> {
        let runtime = Handle::try_current()
            .map_err(|e| AppError::ResourceAllocation(format!("no runtime for consumer task: {}", e)))?;

        let shared = self.shared.clone();
        shared.counters.reset();
        let reset = shared.signal.update(|s| {
            s.reset_counts();
            s.channel = shared.channel();
            s.is_active = true;
        });
        if !shared.counters.observe(reset).is_updated() {
            warn!("Signal counters not reset for {}; previous counts carry over", mode);
        }

        let poll = self.config.consumer_poll();
        let channel = shared.channel();

        let task = match mode {
            RadioMode::Sniffing => {
                let _ = shared.counters.observe(shared.history.update(|h| h.clear()));
                let (producer, consumer) = event_queue(
                    self.config.capture_queue_capacity,
                    FrameFilter::All,
                    shared.counters.clone(),
                )?;
                let task = runtime.spawn(sessions::run_sniffer(consumer, shared, poll));
                self.hand_over(channel, producer, task)?
            }
            RadioMode::DetectingAttack => {
                shared.deauth_reset.store(false, Ordering::Release);
                let _ = shared
                    .counters
                    .observe(shared.deauth.update(|s| *s = DeauthStatistics::default()));
                let _ = shared
                    .counters
                    .observe(shared.recent_deauths.update(|r| r.clear()));
                let (producer, consumer) = event_queue(
                    self.config.deauth_queue_capacity,
                    FrameFilter::DeauthOnly,
                    shared.counters.clone(),
                )?;
                let policy = self.config.deauth.clone();
                let task = runtime.spawn(sessions::run_detector(consumer, shared, policy, poll));
                self.hand_over(channel, producer, task)?
            }
            RadioMode::Scanning => {
                let _ = shared.counters.observe(shared.networks.update(|n| n.clear()));
                let interval = self.config.scan_interval();
                runtime.spawn(sessions::run_scanner(self.radio.clone(), shared, interval))
            }
            RadioMode::Spamming => {
                self.radio.set_channel(channel)?;
                let ssids = self.config.spam_ssids.clone();
                let interval = self.config.beacon_interval();
                runtime.spawn(sessions::run_spammer(self.radio.clone(), shared, ssids, interval))
            }
        };

        Ok(task)
    }

    /// Start radio capture into `producer`; the task is aborted if the radio refuses
    fn hand_over(
        &self,
        channel: u8,
        producer: crate::capture::queue::EventProducer,
        task: JoinHandle<()>,
    ) -> AppResult<JoinHandle<()>> {
        match self.radio.begin_capture(channel, producer) {
            Ok(()) => Ok(task),
            Err(e) => {
                task.abort();
                Err(e.into())
            }
        }
    }

    /// Release the radio, stop the consumer task and go idle
    async fn teardown(&mut self) {
        let captures = self.state.mode().map(|m| m.captures()).unwrap_or(false);
        if captures || self.state == ModuleState::Error {
            if let Err(e) = self.radio.end_capture() {
                warn!("Radio {} did not stop cleanly: {}", self.radio.name(), e);
            }
        }

        if let Some(session) = self.session.take() {
            session.task.abort();
            match session.task.await {
                Err(e) if e.is_panic() => warn!("Consumer for {} panicked", session.info.mode),
                _ => debug!("Consumer for {} released", session.info.mode),
            }
            info!("Stopped {} (session {})", session.info.mode, session.info.id);
        }

        let _ = self
            .shared
            .counters
            .observe(self.shared.signal.update(|s| s.is_active = false));
        self.state = ModuleState::Idle;
    }

    /// Retune the radio.
    ///
    /// Capturing modes retune immediately; other modes pick the channel up on
    /// their next start or transmission.
    pub fn set_channel(&mut self, channel: u8) -> AppResult<()> {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
            return Err(AppError::InvalidChannel(channel));
        }
        let retune = self.state.mode().map(|m| m.captures() || m == RadioMode::Spamming);
        if retune == Some(true) {
            self.radio.set_channel(channel)?;
        }

        self.shared.channel.store(channel, Ordering::Relaxed);
        self.config.channel = channel;
        let _ = self
            .shared
            .counters
            .observe(self.shared.signal.update(|s| s.channel = channel));
        info!("Channel set to {}", channel);
        Ok(())
    }

    /// Zero the deauth statistics and ask the detector to forget its state
    pub fn reset_deauth_statistics(&self) {
        self.shared.deauth_reset.store(true, Ordering::Release);
        let _ = self
            .shared
            .counters
            .observe(self.shared.deauth.update(|s| *s = DeauthStatistics::default()));
        let _ = self
            .shared
            .counters
            .observe(self.shared.recent_deauths.update(|r| r.clear()));
        info!("Deauth statistics reset");
    }

    pub fn get_module_state(&self) -> ModuleState {
        self.state
    }

    pub fn session_info(&self) -> Option<SessionInfo> {
        self.session.as_ref().map(|s| s.info.clone())
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            state: self.state,
            channel: self.shared.channel(),
            radio: self.radio.name().to_string(),
            session: self.session_info(),
        }
    }

    /// Copy of the signal counters; zeroed if the lock is contended
    pub fn get_signal_statistics(&self) -> SignalStatistics {
        let mut stats = self.shared.signal.snapshot();
        stats.channel = self.shared.channel();
        stats
    }

    /// Up to `max_samples` most recent RSSI samples, oldest first.
    ///
    /// Unwritten slots read as the -100 dBm floor, and so does every sample if
    /// the buffer is momentarily locked.
    pub fn get_signal_history(&self, max_samples: usize) -> Vec<i8> {
        self.shared
            .history
            .read(|h| h.recent(max_samples))
            .unwrap_or_else(|| vec![RSSI_FLOOR; max_samples.min(self.config.history_size)])
    }

    pub fn get_deauth_statistics(&self) -> DeauthStatistics {
        self.shared.deauth.snapshot()
    }

    /// Most recent deauth/disassoc events seen by the detector, oldest first
    pub fn get_recent_deauth_events(&self) -> Vec<CaptureEvent> {
        self.shared.recent_deauths.snapshot()
    }

    /// Networks from the last completed scan
    pub fn get_networks(&self) -> Vec<NetworkInfo> {
        self.shared.networks.snapshot()
    }

    pub fn get_pipeline_counters(&self) -> PipelineSnapshot {
        self.shared.counters.snapshot()
    }
}

impl Drop for ModeCoordinator {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            if session.info.mode.captures() {
                let _ = self.radio.end_capture();
            }
            session.task.abort();
        }
    }
}
