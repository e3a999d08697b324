//! Fixed-capacity circular storage.
//!
//! Every slot is initialized at construction, so readers never need to
//! distinguish a partially filled buffer from a full one.

use crate::models::stats::RSSI_FLOOR;

/// Circular buffer that overwrites its oldest element once full
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Box<[T]>,
    /// Index the next write goes to; also the oldest element
    next: usize,
}

impl<T: Clone> RingBuffer<T> {
    /// Create a buffer with every slot holding `fill`.
    ///
    /// Capacity is clamped to at least 1.
    pub fn filled(capacity: usize, fill: T) -> Self {
        Self {
            slots: vec![fill; capacity.max(1)].into_boxed_slice(),
            next: 0,
        }
    }

    /// Overwrite the oldest slot
    pub fn push(&mut self, value: T) {
        self.slots[self.next] = value;
        self.next = (self.next + 1) % self.slots.len();
    }

    /// The last `count` slots, oldest first.
    ///
    /// `count` is clamped to the capacity. Slots never written still hold the
    /// fill value, so the result always has exactly `min(count, capacity)`
    /// elements.
    pub fn last(&self, count: usize) -> Vec<T> {
        let cap = self.slots.len();
        let count = count.min(cap);
        let start = (self.next + cap - count) % cap;
        (0..count)
            .map(|i| self.slots[(start + i) % cap].clone())
            .collect()
    }

    /// Every slot, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.last(self.slots.len())
    }

    /// Refill every slot and rewind
    pub fn reset(&mut self, fill: T) {
        for slot in self.slots.iter_mut() {
            *slot = fill.clone();
        }
        self.next = 0;
    }
}

/// Rolling history of signal-strength samples
#[derive(Debug, Clone)]
pub struct SignalHistoryBuffer {
    ring: RingBuffer<i8>,
}

impl SignalHistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::filled(capacity, RSSI_FLOOR),
        }
    }

    pub fn push(&mut self, rssi: i8) {
        self.ring.push(rssi);
    }

    /// Up to `max_samples` most recent samples in chronological order
    pub fn recent(&self, max_samples: usize) -> Vec<i8> {
        self.ring.last(max_samples)
    }

    pub fn clear(&mut self) {
        self.ring.reset(RSSI_FLOOR);
    }
}
