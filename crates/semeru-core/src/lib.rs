//! # semeru-core
//!
//! Core polling logic for semeru-watch - shared by the CLI and tests.
//!
//! This crate provides:
//! - Data models (`models` module)
//! - Date normalization, page parsing, sessions and the poll loop (`services` module)
//! - Unified error handling (`error` module)

pub mod error;
pub mod models;
pub mod services;

// Re-exports for convenience
pub use error::{Error, Result};

// Re-export commonly used types from models
pub use models::{CapacityQuery, CapacitySlot, SlotStatus, DEFAULT_SITE_ID};

// Re-export commonly used types from services
pub use services::{
    find_slot, normalize_local_date, parse_capacity_page, parse_target, year_month_of,
    BackoffConfig, ClientConfig, EventCallback, ExpiryDetector, HttpSessionClient, PollConfig,
    PollEvent, PollLoop, PollPhase, SessionClient, SessionState, SlotEvent,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_version_format() {
        let v = version();
        // Should be semver format: x.y.z
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "Version should be in x.y.z format");
    }
}
