//! Shared helpers for semeru-core integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use semeru_core::{CapacityQuery, Error, EventCallback, PollEvent, Result, SessionClient};
use tokio_util::sync::CancellationToken;

// =============================================================================
// HTML fixtures
// =============================================================================

/// Wrap rows in the capacity table markup
pub fn page(rows: &[String]) -> String {
    format!(
        r#"<div class="table-responsive"><table class="table table-bordered">
<thead><tr><th>Tanggal</th><th>Kuota</th></tr></thead>
<tbody>{}</tbody></table></div>"#,
        rows.join("\n")
    )
}

pub fn available_row(label: &str, remaining: u32) -> String {
    format!(
        r#"<tr><td>{}</td><td><span class="text-green">Tersedia</span> <span class="hide">{}</span></td></tr>"#,
        label, remaining
    )
}

pub fn full_hidden_row(label: &str) -> String {
    format!(
        r#"<tr><td>{}</td><td><span class="text-red">Kuota Penuh</span> <span class="hide"></span></td></tr>"#,
        label
    )
}

// =============================================================================
// Scripted client
// =============================================================================

/// Shared view of what the scripted client was asked to do
#[derive(Default)]
pub struct Calls {
    pub acquires: AtomicU32,
    pub queries: AtomicU32,
    pub log: Mutex<Vec<&'static str>>,
}

impl Calls {
    pub fn acquires(&self) -> u32 {
        self.acquires.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> u32 {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

/// `SessionClient` replaying a fixed list of query results
///
/// Cancels `cancel` when it hands out its last scripted result, so a loop
/// driven by it stops right after processing the script.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String>>>,
    failing_acquires: AtomicU32,
    pub calls: Arc<Calls>,
    cancel: CancellationToken,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String>>, cancel: CancellationToken) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            failing_acquires: AtomicU32::new(0),
            calls: Arc::new(Calls::default()),
            cancel,
        }
    }

    /// Make the first `n` handshakes fail with a network error
    pub fn with_failing_acquires(self, n: u32) -> Self {
        self.failing_acquires.store(n, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl SessionClient for ScriptedClient {
    type Session = u32;

    async fn acquire_session(&self) -> Result<u32> {
        self.calls.log.lock().unwrap().push("acquire");
        let remaining_failures = self.failing_acquires.load(Ordering::SeqCst);
        if remaining_failures > 0 {
            self.failing_acquires.store(remaining_failures - 1, Ordering::SeqCst);
            return Err(Error::network("Connection failed"));
        }
        Ok(self.calls.acquires.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn query_capacity(&self, _session: &u32, _query: &CapacityQuery) -> Result<String> {
        self.calls.log.lock().unwrap().push("query");
        self.calls.queries.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        let next = responses
            .pop_front()
            .unwrap_or_else(|| Err(Error::network("script exhausted")));
        if responses.is_empty() {
            self.cancel.cancel();
        }
        next
    }
}

// =============================================================================
// Event collection
// =============================================================================

/// Callback storing every event, plus a handle to read them back
pub fn collector() -> (EventCallback, Arc<Mutex<Vec<PollEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let callback: EventCallback = Box::new(move |event: &PollEvent| {
        sink.lock().unwrap().push(event.clone());
    });
    (callback, events)
}
