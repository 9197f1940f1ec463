//! Session handling for the booking site
//!
//! The capacity view only answers requests that carry a valid `ci_session`
//! cookie, so every query runs inside a session obtained by a handshake.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ trait SessionClient                                     │
//! │   - acquire_session()  -> Session                       │
//! │   - query_capacity()   -> raw HTML                      │
//! │   - query()            -> refresh every 100 requests    │
//! └─────────────────────────────────────────────────────────┘
//!          │                              ▲
//!          ▼                              │
//! ┌──────────────────┐        ┌──────────────────────────┐
//! │ HttpSessionClient│        │ SessionState<Session>    │
//! │ (reqwest + jar)  │        │ owned by the PollLoop    │
//! └──────────────────┘        └──────────────────────────┘
//! ```
//!
//! Clients never retry: every failure goes straight back to the caller, which
//! owns the retry schedule.

pub mod expiry;
pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::CapacityQuery;

pub use expiry::ExpiryDetector;
pub use http::{ClientConfig, HttpSession, HttpSessionClient};

/// Number of successful requests served by one session before it is replaced
pub const REFRESH_AFTER_REQUESTS: u32 = 100;

// ============================================================================
// Session State
// ============================================================================

/// A live session plus its request counter
#[derive(Debug)]
pub struct SessionState<S> {
    session: S,
    requests: u32,
    generation: u64,
    acquired_at: DateTime<Utc>,
}

impl<S> SessionState<S> {
    /// Wrap a freshly acquired session
    pub fn new(session: S) -> Self {
        Self {
            session,
            requests: 0,
            generation: 1,
            acquired_at: Utc::now(),
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Successful requests served by the current session
    pub fn requests(&self) -> u32 {
        self.requests
    }

    /// Incremented every time the session is replaced
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Whether the next request must run on a fresh session
    pub fn needs_refresh(&self) -> bool {
        self.requests >= REFRESH_AFTER_REQUESTS
    }

    /// Swap in a new session and reset the counter
    pub fn replace(&mut self, session: S) {
        self.session = session;
        self.requests = 0;
        self.generation += 1;
        self.acquired_at = Utc::now();
    }

    fn record_request(&mut self) {
        self.requests += 1;
    }
}

// ============================================================================
// Client Trait
// ============================================================================

/// Source of capacity pages
///
/// Implemented by [`HttpSessionClient`] for the real site; tests implement it
/// with scripted responses.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Opaque session handle (cookies, tokens)
    type Session: Send + Sync;

    /// Perform the handshake and return a new session
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` on connection, timeout or HTTP failures.
    async fn acquire_session(&self) -> Result<Self::Session>;

    /// Fetch the raw capacity view for `query`
    ///
    /// # Errors
    ///
    /// - `Error::SessionExpired` when the server asks for a new session
    /// - `Error::Network` on connection, timeout or HTTP failures
    async fn query_capacity(&self, session: &Self::Session, query: &CapacityQuery)
        -> Result<String>;

    /// Query through `state`, replacing the session once it has served
    /// [`REFRESH_AFTER_REQUESTS`] requests
    ///
    /// Only successful queries are counted.
    async fn query(
        &self,
        state: &mut SessionState<Self::Session>,
        query: &CapacityQuery,
    ) -> Result<String> {
        if state.needs_refresh() {
            log::info!(
                "[session] {} requests served, acquiring a fresh session",
                state.requests()
            );
            let fresh = self.acquire_session().await?;
            state.replace(fresh);
        }

        let body = self.query_capacity(state.session(), query).await?;
        state.record_request();
        Ok(body)
    }
}
