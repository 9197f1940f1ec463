//! Capacity polling
//!
//! Repeatedly queries the capacity view for the target date, reports changes
//! and backs off exponentially on failure. Runs until cancelled.
//!
//! # State machine
//!
//! ```text
//!   INIT ──acquire ok──▶ POLLING ──query/parse ok──▶ sleep(interval) ─┐
//!    │                    ▲   │                                        │
//!    │ acquire failed     │   │ Network / SessionExpired / Markup      │
//!    ▼                    │   ▼                                        │
//!   BACKOFF ◀─────────────┼─ BACKOFF: sleep(min(base × 2^n, max))      │
//!                         │   then re-acquire session if needed        │
//!                         └────────────────────────────────────────────┘
//!
//!   any sleep ──CancellationToken──▶ STOPPED
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use semeru_core::services::poll::{PollConfig, PollLoop};
//! use semeru_core::services::session::{ClientConfig, HttpSessionClient};
//!
//! let config = PollConfig::new(target).with_force_ipv4(true);
//! let client = HttpSessionClient::new(ClientConfig::default().with_force_ipv4(true))?;
//! let mut poller = PollLoop::new(client, config, Box::new(|event| println!("{:?}", event)))?;
//! poller.run(cancel_token).await;
//! ```

pub mod backoff;
pub mod config;
pub mod events;
pub mod runner;
pub mod tracker;

pub use backoff::BackoffState;
pub use config::{
    BackoffConfig, PollConfig, DEFAULT_BASE_DELAY_SECS, DEFAULT_INTERVAL_SECS,
    DEFAULT_MAX_DELAY_SECS, ERROR_STREAK_REFRESH,
};
pub use events::{EventCallback, PollEvent, SlotEvent};
pub use runner::{PollLoop, PollPhase};
pub use tracker::SlotTracker;
