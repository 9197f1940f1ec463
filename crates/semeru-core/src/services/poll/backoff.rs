//! Exponential backoff state

use std::time::Duration;

use super::config::BackoffConfig;

/// Retry schedule owned by the poll loop
///
/// The n-th consecutive failure (counting from zero) waits
/// `min(base × 2^n, max)`; a success resets the count.
#[derive(Debug, Clone)]
pub struct BackoffState {
    base_delay: Duration,
    max_delay: Duration,
    failure_count: u32,
}

impl BackoffState {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            base_delay: config.base_delay,
            max_delay: config.max_delay,
            failure_count: 0,
        }
    }

    /// Consecutive failures since the last success
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Delay the schedule assigns to a given failure count
    pub fn delay_for(&self, failure_count: u32) -> Duration {
        2u32.checked_pow(failure_count)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Delay the next failure would get
    pub fn current_delay(&self) -> Duration {
        self.delay_for(self.failure_count)
    }

    /// Register a failure and return how long to wait before recovering
    pub fn record_failure(&mut self) -> Duration {
        let delay = self.current_delay();
        self.failure_count = self.failure_count.saturating_add(1);
        delay
    }

    /// Back to the base delay after a success
    pub fn reset(&mut self) {
        self.failure_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff(base: u64, max: u64) -> BackoffState {
        BackoffState::new(BackoffConfig::new(
            Duration::from_secs(base),
            Duration::from_secs(max),
        ))
    }

    #[test]
    fn test_delays_double() {
        let state = backoff(2, 600);
        assert_eq!(state.delay_for(0), Duration::from_secs(2));
        assert_eq!(state.delay_for(1), Duration::from_secs(4));
        assert_eq!(state.delay_for(2), Duration::from_secs(8));
        assert_eq!(state.delay_for(3), Duration::from_secs(16));
    }

    #[test]
    fn test_delays_capped() {
        let state = backoff(2, 10);
        assert_eq!(state.delay_for(3), Duration::from_secs(10));
        assert_eq!(state.delay_for(40), Duration::from_secs(10));
        assert_eq!(state.delay_for(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_record_failure_sequence() {
        let mut state = backoff(1, 60);
        let delays: Vec<u64> = (0..4).map(|_| state.record_failure().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8]);
        assert_eq!(state.failure_count(), 4);
    }

    #[test]
    fn test_reset_returns_to_base() {
        let mut state = backoff(3, 60);
        state.record_failure();
        state.record_failure();
        state.reset();
        assert_eq!(state.failure_count(), 0);
        assert_eq!(state.current_delay(), Duration::from_secs(3));
    }
}
