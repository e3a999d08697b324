//! Single-writer, multi-reader state guarded by short bounded lock waits.

use log::debug;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::models::stats::PipelineSnapshot;

/// Whether a writer got the lock in time
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Updated,
    /// The lock stayed contended for the whole wait; nothing was written
    Skipped,
}

impl LockOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, LockOutcome::Updated)
    }
}

/// Cloneable handle to state read by reporters and written by one consumer
#[derive(Debug)]
pub struct SharedState<T> {
    inner: Arc<RwLock<T>>,
    wait: Duration,
}

impl<T> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            wait: self.wait,
        }
    }
}

impl<T> SharedState<T> {
    pub fn new(value: T, wait: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
            wait,
        }
    }

    /// Apply `f` if the write lock is acquired within the bounded wait
    pub fn update<F>(&self, f: F) -> LockOutcome
    where
        F: FnOnce(&mut T),
    {
        match self.inner.try_write_for(self.wait) {
            Some(mut guard) => {
                f(&mut guard);
                LockOutcome::Updated
            }
            None => {
                debug!("Statistics update skipped after {:?} of contention", self.wait);
                LockOutcome::Skipped
            }
        }
    }

    /// Read through `f`, or `None` if the lock could not be taken in time
    pub fn read<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.try_read_for(self.wait).map(|guard| f(&guard))
    }
}

impl<T: Clone + Default> SharedState<T> {
    /// A copy of the current value, or the inactive default under contention
    pub fn snapshot(&self) -> T {
        self.read(T::clone).unwrap_or_default()
    }
}

/// Loss and throughput counters shared by producer, consumer and reporters
#[derive(Debug, Default)]
pub struct PipelineCounters {
    processed: AtomicU64,
    dropped: AtomicU64,
    skipped: AtomicU64,
}

impl PipelineCounters {
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a skipped update and pass the outcome through
    pub fn observe(&self, outcome: LockOutcome) -> LockOutcome {
        if outcome == LockOutcome::Skipped {
            self.skipped.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    pub fn reset(&self) {
        self.processed.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            processed_events: self.processed.load(Ordering::Relaxed),
            dropped_events: self.dropped.load(Ordering::Relaxed),
            skipped_updates: self.skipped.load(Ordering::Relaxed),
        }
    }
}
