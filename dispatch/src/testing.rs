//! Scripted [`Transport`] for tests of code built on the dispatcher.
//!
//! Enabled for this crate's own tests and, for dependents, through the
//! `test-util` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::transport::{RawResponse, Transport, TransportError};

/// One scripted reaction to a request.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(RawResponse),
    Fail(TransportError),
    /// Never answers within any sane attempt timeout.
    Hang,
}

impl Step {
    #[must_use]
    pub fn reply(status: u16, body: impl Into<String>) -> Self {
        Self::Reply(RawResponse::new(status, body))
    }
}

/// Replays steps in order and records every request. Once the script runs
/// out, every call fails with a network error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicU32,
    requests: Mutex<Vec<(String, serde_json::Value)>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedTransport {
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self { steps: Mutex::new(steps.into()), ..Self::default() })
    }

    /// A single 200 reply carrying `body`.
    #[must_use]
    pub fn ok(body: serde_json::Value) -> Arc<Self> {
        Self::new(vec![Step::reply(200, body.to_string())])
    }

    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// URL and body of the most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<(String, serde_json::Value)> {
        lock(&self.requests).last().cloned()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push((url.to_string(), body.clone()));
        let step = lock(&self.steps).pop_front();
        match step {
            Some(Step::Reply(r)) => Ok(r),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Network("hang ended".into()))
            }
            None => Err(TransportError::Network("script exhausted".into())),
        }
    }
}
