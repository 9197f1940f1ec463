//! Events emitted by the poll loop

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::CapacitySlot;

/// Observation of the watched slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotEvent {
    pub slot: CapacitySlot,
    /// Whether status or remaining differ from the previous cycle
    pub changed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Everything the loop reports to its renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PollEvent {
    /// Target slot observed
    Slot(SlotEvent),

    /// The page loaded but has no row for the target date
    TargetMissing {
        target: NaiveDate,
        year_month: String,
        timestamp: DateTime<Utc>,
    },

    /// A cycle failed; the loop waits `delay_ms` before recovering
    Retrying {
        kind: &'static str,
        message: String,
        delay_ms: u64,
        failure_count: u32,
        timestamp: DateTime<Utc>,
    },

    /// A new session replaced the previous one
    SessionRefreshed {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The loop was cancelled
    Stopped { timestamp: DateTime<Utc> },
}

impl PollEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            PollEvent::Slot(event) => event.timestamp,
            PollEvent::TargetMissing { timestamp, .. }
            | PollEvent::Retrying { timestamp, .. }
            | PollEvent::SessionRefreshed { timestamp, .. }
            | PollEvent::Stopped { timestamp } => *timestamp,
        }
    }

    /// The slot event, if this is one
    pub fn as_slot(&self) -> Option<&SlotEvent> {
        match self {
            PollEvent::Slot(event) => Some(event),
            _ => None,
        }
    }
}

/// Callback receiving every event, in order
pub type EventCallback = Box<dyn Fn(&PollEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlotStatus;

    #[test]
    fn test_slot_event_json_shape() {
        let event = PollEvent::Slot(SlotEvent {
            slot: CapacitySlot::new(
                NaiveDate::from_ymd_opt(2025, 10, 18).unwrap(),
                "18 Oktober 2025",
                "Tersedia",
                SlotStatus::Available,
                Some(5),
            ),
            changed: true,
            timestamp: Utc::now(),
        });
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "slot");
        assert_eq!(json["changed"], true);
        assert_eq!(json["slot"]["date"], "2025-10-18");
        assert_eq!(json["slot"]["status"], "available");
        assert_eq!(json["slot"]["remaining"], 5);
    }

    #[test]
    fn test_retrying_json_shape() {
        let event = PollEvent::Retrying {
            kind: "network error",
            message: "Network error: Request timed out".to_string(),
            delay_ms: 4000,
            failure_count: 2,
            timestamp: Utc::now(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "retrying");
        assert_eq!(json["kind"], "network error");
        assert_eq!(json["delay_ms"], 4000);
        assert!(event.as_slot().is_none());
    }
}
