//! The poll loop state machine

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::backoff::BackoffState;
use super::config::{PollConfig, ERROR_STREAK_REFRESH};
use super::events::{EventCallback, PollEvent, SlotEvent};
use super::tracker::SlotTracker;
use crate::error::{Error, Result};
use crate::models::{CapacityQuery, CapacitySlot};
use crate::services::capacity_page::{find_slot, parse_capacity_page};
use crate::services::session::{SessionClient, SessionState};

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Init,
    Polling,
    Backoff,
    Stopped,
}

/// Watches one target date until cancelled
///
/// Owns the session and backoff state; nothing is shared, so no locking.
pub struct PollLoop<C: SessionClient> {
    client: C,
    config: PollConfig,
    query: CapacityQuery,
    session: Option<SessionState<C::Session>>,
    /// Reason to replace the session before the next query
    pending_refresh: Option<String>,
    backoff: BackoffState,
    tracker: SlotTracker,
    phase: PollPhase,
    on_event: EventCallback,
}

impl<C: SessionClient> PollLoop<C> {
    /// Create a loop; the configuration is validated here
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` is invalid.
    pub fn new(client: C, config: PollConfig, on_event: EventCallback) -> Result<Self> {
        let config = config.validate()?;
        Ok(Self {
            query: config.query(),
            backoff: BackoffState::new(config.backoff),
            client,
            config,
            session: None,
            pending_refresh: None,
            tracker: SlotTracker::new(),
            phase: PollPhase::Init,
            on_event,
        })
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn backoff(&self) -> &BackoffState {
        &self.backoff
    }

    pub fn session(&self) -> Option<&SessionState<C::Session>> {
        self.session.as_ref()
    }

    /// Poll until `cancel` fires
    ///
    /// Failures never end the loop: each one sends it through backoff and
    /// back to polling. Cancellation also interrupts a cycle whose request is
    /// still in flight.
    pub async fn run(&mut self, cancel: CancellationToken) {
        if self.phase == PollPhase::Stopped {
            return;
        }
        log::info!(
            "[poll] watching {} (site {}, every {}s)",
            self.config.target,
            self.config.site_id,
            self.config.interval.as_secs_f64()
        );

        while !cancel.is_cancelled() {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = self.step() => outcome,
            };
            let delay = match outcome {
                Ok(_) => {
                    self.phase = PollPhase::Polling;
                    self.config.interval
                }
                Err(e) => {
                    self.phase = PollPhase::Backoff;
                    self.enter_backoff(&e)
                }
            };

            if !sleep_or_cancel(delay, &cancel).await {
                break;
            }
        }

        self.phase = PollPhase::Stopped;
        log::info!("[poll] stopped");
        self.emit(PollEvent::Stopped {
            timestamp: Utc::now(),
        });
    }

    /// Run a single polling step without sleeping or backing off
    ///
    /// Acquires a session first if there is none.
    pub async fn poll_once(&mut self) -> Result<Option<CapacitySlot>> {
        self.step().await
    }

    /// Fetch and parse the whole month of the target date
    ///
    /// Acquires a session first if there is none. Change tracking is left
    /// untouched, so no slot events are emitted.
    pub async fn fetch_slots(&mut self) -> Result<Vec<CapacitySlot>> {
        self.ensure_session().await?;

        let state = self
            .session
            .as_mut()
            .ok_or_else(|| Error::session_expired("no active session"))?;
        let generation = state.generation();
        let result = self.client.query(state, &self.query).await;
        let refreshed = state.generation() != generation;

        // A replaced session is reported even when the query on it failed
        if refreshed {
            self.emit(PollEvent::SessionRefreshed {
                reason: "request limit reached".to_string(),
                timestamp: Utc::now(),
            });
        }

        let slots = parse_capacity_page(&result?)?;
        self.backoff.reset();
        Ok(slots)
    }

    async fn step(&mut self) -> Result<Option<CapacitySlot>> {
        let slots = self.fetch_slots().await?;
        Ok(self.observe(&slots))
    }

    /// Acquire a first session, or replace the current one if recovery asked
    /// for it
    async fn ensure_session(&mut self) -> Result<()> {
        if self.session.is_none() {
            let session = self.client.acquire_session().await?;
            self.session = Some(SessionState::new(session));
            self.pending_refresh = None;
            return Ok(());
        }

        let Some(reason) = self.pending_refresh.take() else {
            return Ok(());
        };
        match self.client.acquire_session().await {
            Ok(fresh) => {
                if let Some(state) = self.session.as_mut() {
                    state.replace(fresh);
                }
                log::info!("[poll] session refreshed ({})", reason);
                self.emit(PollEvent::SessionRefreshed {
                    reason,
                    timestamp: Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                self.pending_refresh = Some(reason);
                Err(e)
            }
        }
    }

    /// Diff the target slot against the previous cycle and report it
    fn observe(&mut self, slots: &[CapacitySlot]) -> Option<CapacitySlot> {
        let found = find_slot(slots, self.config.target).cloned();
        match &found {
            Some(slot) => {
                let changed = self.tracker.observe_slot(slot);
                if changed {
                    log::info!(
                        "[poll] {} is now {} (remaining: {:?})",
                        slot.date,
                        slot.status,
                        slot.remaining
                    );
                }
                if changed || self.config.emit_unchanged {
                    self.emit(PollEvent::Slot(SlotEvent {
                        slot: slot.clone(),
                        changed,
                        timestamp: Utc::now(),
                    }));
                }
            }
            None => {
                log::debug!(
                    "[poll] {} not in {} ({} rows)",
                    self.config.target,
                    self.query.year_month,
                    slots.len()
                );
                if self.tracker.observe_missing() {
                    self.emit(PollEvent::TargetMissing {
                        target: self.config.target,
                        year_month: self.query.year_month.clone(),
                        timestamp: Utc::now(),
                    });
                }
            }
        }

        found
    }

    /// Register a failure and decide how recovery starts; returns the delay
    fn enter_backoff(&mut self, err: &Error) -> Duration {
        let delay = self.backoff.record_failure();
        let failures = self.backoff.failure_count();

        if self.session.is_some() && self.pending_refresh.is_none() {
            if err.needs_new_session() {
                self.pending_refresh = Some(err.kind().to_string());
            } else if failures >= ERROR_STREAK_REFRESH {
                self.pending_refresh = Some(format!("{} consecutive failures", failures));
            }
        }

        log::warn!(
            "[poll] {} (failure #{}), retrying in {:.1}s",
            err,
            failures,
            delay.as_secs_f64()
        );
        self.emit(PollEvent::Retrying {
            kind: err.kind(),
            message: err.to_string(),
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            failure_count: failures,
            timestamp: Utc::now(),
        });
        delay
    }

    fn emit(&self, event: PollEvent) {
        (self.on_event)(&event);
    }
}

/// Sleep for `delay`; returns `false` if cancelled first
async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
