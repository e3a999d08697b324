//! Bounded per-source frequency tracking.
//!
//! A fixed arena of slots with linear lookup. A slot whose count is zero is
//! free; aging resets counts instead of removing slots, so memory never grows.

use crate::models::event::MacAddr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SourceSlot {
    addr: MacAddr,
    count: u32,
    last_seen_ms: u64,
}

impl SourceSlot {
    fn is_free(&self) -> bool {
        self.count == 0
    }
}

/// What happened to an observed source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Source already tracked; carries its updated count
    Seen(u32),
    /// Source took a free slot
    Inserted,
    /// Arena full; the source is not tracked
    Untracked,
}

/// Maps source address to `{count, last seen}` within a fixed capacity
#[derive(Debug, Clone)]
pub struct SourceFrequencyTracker {
    slots: Box<[SourceSlot]>,
}

impl SourceFrequencyTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![SourceSlot::default(); capacity.max(1)].into_boxed_slice(),
        }
    }

    /// Number of occupied slots
    pub fn active(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_free()).count()
    }

    pub fn count_for(&self, addr: &MacAddr) -> u32 {
        self.find(addr).map(|i| self.slots[i].count).unwrap_or(0)
    }

    /// Record one event from `addr` at `now_ms`
    pub fn observe(&mut self, addr: MacAddr, now_ms: u64) -> Observation {
        if let Some(idx) = self.find(&addr) {
            let slot = &mut self.slots[idx];
            slot.count = slot.count.saturating_add(1);
            slot.last_seen_ms = now_ms;
            return Observation::Seen(slot.count);
        }

        match self.slots.iter_mut().find(|s| s.is_free()) {
            Some(slot) => {
                *slot = SourceSlot {
                    addr,
                    count: 1,
                    last_seen_ms: now_ms,
                };
                Observation::Inserted
            }
            None => Observation::Untracked,
        }
    }

    /// Free every slot idle for longer than `max_age_ms`; returns how many
    pub fn expire(&mut self, now_ms: u64, max_age_ms: u64) -> usize {
        let mut freed = 0;
        for slot in self.slots.iter_mut().filter(|s| !s.is_free()) {
            if now_ms.saturating_sub(slot.last_seen_ms) > max_age_ms {
                slot.count = 0;
                freed += 1;
            }
        }
        freed
    }

    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = SourceSlot::default();
        }
    }

    fn find(&self, addr: &MacAddr) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| !s.is_free() && s.addr == *addr)
    }
}
