//! Data models for semeru-watch

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::services::dates::year_month_of;

/// Default site id on the booking site (8 = Semeru)
pub const DEFAULT_SITE_ID: u32 = 8;

// ============================================================================
// Slot Types
// ============================================================================

/// Availability classification of one capacity slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Quota left for this date
    Available,
    /// Quota exhausted ("Kuota Penuh")
    Full,
    /// Row present but neither full nor clearly available
    Unknown,
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotStatus::Available => write!(f, "available"),
            SlotStatus::Full => write!(f, "full"),
            SlotStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One row of the capacity table
///
/// A `Full` slot never carries a remaining count, whatever the page hid in
/// its markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacitySlot {
    /// Normalized date of the row
    pub date: NaiveDate,
    /// Raw date text as rendered (e.g. "Sabtu, 18 Oktober 2025")
    pub label: String,
    /// Raw status text as rendered (e.g. "Kuota Penuh")
    pub status_text: String,
    pub status: SlotStatus,
    /// Remaining quota ("sisa"), when the page exposes it
    pub remaining: Option<u32>,
}

impl CapacitySlot {
    /// Create a slot, enforcing that full slots have no remaining count
    pub fn new(
        date: NaiveDate,
        label: impl Into<String>,
        status_text: impl Into<String>,
        status: SlotStatus,
        remaining: Option<u32>,
    ) -> Self {
        let remaining = match status {
            SlotStatus::Full => None,
            _ => remaining,
        };
        Self {
            date,
            label: label.into(),
            status_text: status_text.into(),
            status,
            remaining,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }

    /// The part of the slot that matters for change detection
    pub fn state(&self) -> (SlotStatus, Option<u32>) {
        (self.status, self.remaining)
    }
}

// ============================================================================
// Query Types
// ============================================================================

/// Form identity of one capacity view request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityQuery {
    /// Site id (8 = Semeru)
    pub site_id: u32,
    /// Month shown by the view, `YYYY-MM`
    pub year_month: String,
}

impl CapacityQuery {
    /// Query for the month containing `date`
    pub fn for_date(site_id: u32, date: NaiveDate) -> Self {
        Self {
            site_id,
            year_month: year_month_of(date),
        }
    }

    /// Form fields expected by the `get_view` endpoint
    pub fn form_fields(&self) -> [(&'static str, String); 3] {
        [
            ("action", "kapasitas".to_string()),
            ("id_site", self.site_id.to_string()),
            ("year_month", self.year_month.clone()),
        ]
    }
}
