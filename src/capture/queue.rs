//! Bounded event pipeline from the radio callback to a mode's consumer task.
//!
//! The producer side never blocks: a full (or already destroyed) queue drops
//! the event and bumps the pipeline's drop counter.

use log::trace;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::capture::shared::PipelineCounters;
use crate::models::event::CaptureEvent;
use crate::utils::error::{AppError, AppResult};

/// Largest queue a mode may request
pub const MAX_QUEUE_CAPACITY: usize = 4096;

/// Which frames a producer forwards to its queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFilter {
    /// Every captured frame
    All,
    /// Deauthentication and disassociation frames only
    DeauthOnly,
}

impl FrameFilter {
    pub fn accepts(&self, event: &CaptureEvent) -> bool {
        match self {
            FrameFilter::All => true,
            FrameFilter::DeauthOnly => event.frame_class.is_deauth(),
        }
    }
}

/// Result of offering an event to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Produced {
    Queued,
    /// Rejected by the producer's frame filter
    Filtered,
    /// Queue full or destroyed
    Dropped,
}

/// Sending half handed to the radio driver for its frame callback
#[derive(Debug, Clone)]
pub struct EventProducer {
    tx: mpsc::Sender<CaptureEvent>,
    filter: FrameFilter,
    counters: Arc<PipelineCounters>,
}

impl EventProducer {
    /// Offer an event without blocking
    pub fn produce(&self, event: CaptureEvent) -> Produced {
        if !self.filter.accepts(&event) {
            return Produced::Filtered;
        }

        match self.tx.try_send(event) {
            Ok(()) => Produced::Queued,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                self.counters.record_drop();
                Produced::Dropped
            }
        }
    }

    /// Whether the consuming side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Outcome of a bounded wait on the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    Event(CaptureEvent),
    /// Nothing arrived within the wait; time for housekeeping
    Timeout,
    /// Every producer is gone
    Closed,
}

/// Receiving half owned by exactly one consumer task
#[derive(Debug)]
pub struct EventConsumer {
    rx: mpsc::Receiver<CaptureEvent>,
    counters: Arc<PipelineCounters>,
}

impl EventConsumer {
    /// Wait at most `timeout` for the next event
    pub async fn consume(&mut self, timeout: Duration) -> Received {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(event)) => {
                self.counters.record_processed();
                trace!("Dequeued {:?} from {}", event.frame_class, event.source);
                Received::Event(event)
            }
            Ok(None) => Received::Closed,
            Err(_) => Received::Timeout,
        }
    }

    /// Take an event if one is ready
    pub fn try_consume(&mut self) -> Option<CaptureEvent> {
        let event = self.rx.try_recv().ok()?;
        self.counters.record_processed();
        Some(event)
    }
}

/// Create a queue with room for `capacity` events.
///
/// A zero or oversized capacity is an allocation failure.
pub fn event_queue(
    capacity: usize,
    filter: FrameFilter,
    counters: Arc<PipelineCounters>,
) -> AppResult<(EventProducer, EventConsumer)> {
    if capacity == 0 || capacity > MAX_QUEUE_CAPACITY {
        return Err(AppError::ResourceAllocation(format!(
            "event queue capacity {} outside 1..={}",
            capacity, MAX_QUEUE_CAPACITY
        )));
    }

    let (tx, rx) = mpsc::channel(capacity);
    Ok((
        EventProducer {
            tx,
            filter,
            counters: counters.clone(),
        },
        EventConsumer { rx, counters },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{FrameClass, MacAddr};

    fn data_event(ts: u64) -> CaptureEvent {
        CaptureEvent::frame(MacAddr::ZERO, MacAddr::BROADCAST, -50, 6, FrameClass::Data, ts)
    }

    #[test]
    fn overflow_drops_silently_and_keeps_first_events() {
        let counters = Arc::new(PipelineCounters::default());
        let (producer, mut consumer) =
            event_queue(50, FrameFilter::All, counters.clone()).unwrap();

        let outcomes: Vec<Produced> = (0..60).map(|i| producer.produce(data_event(i))).collect();

        assert_eq!(outcomes.iter().filter(|o| **o == Produced::Queued).count(), 50);
        assert_eq!(outcomes.iter().filter(|o| **o == Produced::Dropped).count(), 10);
        assert_eq!(counters.snapshot().dropped_events, 10);

        let mut retained = Vec::new();
        while let Some(event) = consumer.try_consume() {
            retained.push(event.timestamp_ms);
        }
        assert_eq!(retained, (0..50).collect::<Vec<u64>>());
        assert_eq!(counters.snapshot().processed_events, 50);
    }

    #[test]
    fn deauth_filter_skips_other_frames() {
        let counters = Arc::new(PipelineCounters::default());
        let (producer, mut consumer) =
            event_queue(4, FrameFilter::DeauthOnly, counters.clone()).unwrap();

        assert_eq!(producer.produce(data_event(1)), Produced::Filtered);
        let deauth = CaptureEvent::deauth(MacAddr::ZERO, MacAddr::BROADCAST, 7, 2);
        assert_eq!(producer.produce(deauth), Produced::Queued);

        assert_eq!(consumer.try_consume(), Some(deauth));
        assert_eq!(consumer.try_consume(), None);
        assert_eq!(counters.snapshot().dropped_events, 0);
    }

    #[test]
    fn invalid_capacity_is_an_allocation_failure() {
        let counters = Arc::new(PipelineCounters::default());
        assert!(matches!(
            event_queue(0, FrameFilter::All, counters.clone()),
            Err(AppError::ResourceAllocation(_))
        ));
        assert!(matches!(
            event_queue(MAX_QUEUE_CAPACITY + 1, FrameFilter::All, counters),
            Err(AppError::ResourceAllocation(_))
        ));
    }

    #[test]
    fn producing_after_consumer_is_gone_counts_as_drop() {
        let counters = Arc::new(PipelineCounters::default());
        let (producer, consumer) = event_queue(4, FrameFilter::All, counters.clone()).unwrap();
        drop(consumer);

        assert!(producer.is_closed());
        assert_eq!(producer.produce(data_event(0)), Produced::Dropped);
        assert_eq!(counters.snapshot().dropped_events, 1);
    }

    #[tokio::test]
    async fn consume_times_out_then_reports_closed() {
        let counters = Arc::new(PipelineCounters::default());
        let (producer, mut consumer) = event_queue(4, FrameFilter::All, counters).unwrap();

        assert_eq!(
            consumer.consume(Duration::from_millis(10)).await,
            Received::Timeout
        );

        producer.produce(data_event(5));
        assert_eq!(
            consumer.consume(Duration::from_millis(10)).await,
            Received::Event(data_event(5))
        );

        drop(producer);
        assert_eq!(
            consumer.consume(Duration::from_millis(10)).await,
            Received::Closed
        );
    }

    #[tokio::test]
    async fn producer_on_plain_thread_feeds_consumer_in_order() {
        let counters = Arc::new(PipelineCounters::default());
        let (producer, mut consumer) = event_queue(16, FrameFilter::All, counters).unwrap();

        let handle = std::thread::spawn(move || {
            for ts in 0..10 {
                producer.produce(data_event(ts));
            }
        });
        handle.join().unwrap();

        let mut seen = Vec::new();
        while let Received::Event(event) = consumer.consume(Duration::from_millis(20)).await {
            seen.push(event.timestamp_ms);
        }
        assert_eq!(seen, (0..10).collect::<Vec<u64>>());
    }
}
