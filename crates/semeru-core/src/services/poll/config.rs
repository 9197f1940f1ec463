//! Poll loop configuration

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{CapacityQuery, DEFAULT_SITE_ID};

// ============================================================================
// Constants
// ============================================================================

/// Default polling interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 20;

/// Default first backoff delay in seconds
pub const DEFAULT_BASE_DELAY_SECS: u64 = 2;

/// Default backoff ceiling in seconds
pub const DEFAULT_MAX_DELAY_SECS: u64 = 60;

/// Consecutive failures after which the session is replaced whatever the error
pub const ERROR_STREAK_REFRESH: u32 = 3;

// ============================================================================
// Backoff
// ============================================================================

/// Exponential backoff bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(DEFAULT_BASE_DELAY_SECS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
        }
    }
}

impl BackoffConfig {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }
}

// ============================================================================
// Poll Config
// ============================================================================

/// Configuration of one watch run; fixed once the loop starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Date whose slot is watched
    pub target: NaiveDate,
    /// Pause between successful polls
    pub interval: Duration,
    /// Connect over IPv4 only; the client picks it up through
    /// `ClientConfig::for_poll`
    pub force_ipv4: bool,
    /// Site id on the booking site
    pub site_id: u32,
    pub backoff: BackoffConfig,
    /// Also emit slot events when nothing changed (flagged `changed = false`)
    pub emit_unchanged: bool,
}

impl PollConfig {
    /// Create a configuration for `target` with default settings
    pub fn new(target: NaiveDate) -> Self {
        Self {
            target,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            force_ipv4: false,
            site_id: DEFAULT_SITE_ID,
            backoff: BackoffConfig::default(),
            emit_unchanged: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_force_ipv4(mut self, force_ipv4: bool) -> Self {
        self.force_ipv4 = force_ipv4;
        self
    }

    pub fn with_site_id(mut self, site_id: u32) -> Self {
        self.site_id = site_id;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_emit_unchanged(mut self, emit_unchanged: bool) -> Self {
        self.emit_unchanged = emit_unchanged;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a zero interval, a zero base delay, or a
    /// ceiling below the base delay.
    pub fn validate(self) -> Result<Self> {
        if self.interval.is_zero() {
            return Err(Error::config("polling interval must be greater than zero"));
        }
        if self.backoff.base_delay.is_zero() {
            return Err(Error::config("backoff base delay must be greater than zero"));
        }
        if self.backoff.max_delay < self.backoff.base_delay {
            return Err(Error::config(format!(
                "backoff ceiling ({}s) is below the base delay ({}s)",
                self.backoff.max_delay.as_secs_f64(),
                self.backoff.base_delay.as_secs_f64()
            )));
        }
        Ok(self)
    }

    /// Capacity view request covering the target date
    pub fn query(&self) -> CapacityQuery {
        CapacityQuery::for_date(self.site_id, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 18).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = PollConfig::new(target());
        assert_eq!(config.interval, Duration::from_secs(DEFAULT_INTERVAL_SECS));
        assert_eq!(config.site_id, DEFAULT_SITE_ID);
        assert!(!config.force_ipv4);
        assert!(!config.emit_unchanged);
        assert_eq!(config.backoff, BackoffConfig::default());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(PollConfig::new(target()).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let result = PollConfig::new(target()).with_interval(Duration::ZERO).validate();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let result = PollConfig::new(target())
            .with_backoff(BackoffConfig::new(Duration::from_secs(10), Duration::from_secs(5)))
            .validate();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_query_uses_target_month() {
        let query = PollConfig::new(target()).with_site_id(9).query();
        assert_eq!(query.site_id, 9);
        assert_eq!(query.year_month, "2025-10");
    }
}
