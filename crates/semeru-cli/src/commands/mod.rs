//! CLI commands module
//!
//! `watch` runs the poll loop, `check` runs a single polling step. Both share
//! the target and connection options in [`TargetArgs`].

pub mod check;
pub mod watch;

use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;

use crate::output::OutputFormat;
use semeru_core::services::poll::config::{
    DEFAULT_BASE_DELAY_SECS, DEFAULT_INTERVAL_SECS, DEFAULT_MAX_DELAY_SECS,
};
use semeru_core::services::session::http::{BASE_URL, CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use semeru_core::{
    parse_target, BackoffConfig, ClientConfig, HttpSessionClient, PollConfig, DEFAULT_SITE_ID,
};

/// Shared context for all commands
pub struct Context {
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Target date and connection options
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Date to watch: 2025-10-18, "18 Oktober 2025", or a day number with --year-month
    #[arg(long, short, env = "SEMERU_TARGET")]
    pub target: String,

    /// Month for a bare day number (YYYY-MM)
    #[arg(long)]
    pub year_month: Option<String>,

    /// Booking site id (8 = Semeru)
    #[arg(long, default_value_t = DEFAULT_SITE_ID)]
    pub site_id: u32,

    /// Seconds between successful polls
    #[arg(long, env = "SEMERU_INTERVAL", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,

    /// Connect over IPv4 only
    #[arg(long = "ipv4", env = "SEMERU_FORCE_IPV4")]
    pub force_ipv4: bool,

    /// Connect timeout in seconds
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS)]
    pub timeout_connect: u64,

    /// Whole-request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS)]
    pub timeout_read: u64,

    /// Booking site base URL
    #[arg(long, default_value = BASE_URL)]
    pub base_url: String,

    /// Upper bound for the retry delay in seconds
    #[arg(long, default_value_t = DEFAULT_MAX_DELAY_SECS)]
    pub max_backoff: u64,
}

impl TargetArgs {
    pub fn target_date(&self) -> Result<NaiveDate> {
        Ok(parse_target(&self.target, self.year_month.as_deref())?)
    }

    /// Validated loop configuration
    pub fn poll_config(&self, emit_unchanged: bool) -> Result<PollConfig> {
        let config = PollConfig::new(self.target_date()?)
            .with_interval(Duration::from_secs(self.interval))
            .with_site_id(self.site_id)
            .with_force_ipv4(self.force_ipv4)
            .with_backoff(BackoffConfig::new(
                Duration::from_secs(DEFAULT_BASE_DELAY_SECS),
                Duration::from_secs(self.max_backoff),
            ))
            .with_emit_unchanged(emit_unchanged);
        Ok(config.validate()?)
    }

    /// HTTP client for `poll`, with the connection overrides applied
    pub fn client(&self, poll: &PollConfig) -> Result<HttpSessionClient> {
        let config = ClientConfig::for_poll(poll)
            .with_base_url(self.base_url.as_str())
            .with_timeouts(
                Duration::from_secs(self.timeout_connect),
                Duration::from_secs(self.timeout_read),
            );
        Ok(HttpSessionClient::new(config)?)
    }
}
