//! Change detection between poll cycles

use crate::models::{CapacitySlot, SlotStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observation {
    Slot(SlotStatus, Option<u32>),
    Missing,
}

/// Last reported state of the watched slot
///
/// Only status and remaining count take part in the comparison; label or
/// status-text changes alone are not news.
#[derive(Debug, Clone, Default)]
pub struct SlotTracker {
    last: Option<Observation>,
}

impl SlotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the slot seen this cycle; returns `true` if it differs from
    /// the previous cycle (the first observation always does)
    pub fn observe_slot(&mut self, slot: &CapacitySlot) -> bool {
        let (status, remaining) = slot.state();
        self.observe(Observation::Slot(status, remaining))
    }

    /// Record that the target row was absent; returns `true` on the
    /// transition into the missing state
    pub fn observe_missing(&mut self) -> bool {
        self.observe(Observation::Missing)
    }

    /// Forget the last observation
    pub fn clear(&mut self) {
        self.last = None;
    }

    fn observe(&mut self, current: Observation) -> bool {
        let changed = self.last != Some(current);
        self.last = Some(current);
        changed
    }
}
