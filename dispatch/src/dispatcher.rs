//! Request dispatcher — one JSON POST per attempt, driven by [`RetryState`].
//!
//! DESIGN
//! ======
//! Each call is independent: the attempt counter lives on the stack of
//! `call_raw`, nothing is shared between calls. Callers serialise their own
//! requests (one outstanding call per conversation), so there is no circuit
//! breaker or per-endpoint budget here.
//!
//! ERROR HANDLING
//! ==============
//! Transient failures are logged and retried internally. The caller only sees
//! a terminal error: the first non-retryable status, an unexpected body, or
//! `Exhausted` wrapping the last transient failure.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{DispatchError, ErrorCode};
use crate::policy::{AttemptOutcome, RetryPolicy, RetryState, Transition};
use crate::transport::{Transport, TransportError};

/// Longest response excerpt kept in a `Status` error.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// A named external endpoint. The name is only used for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
}

impl Endpoint {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: url.into() }
    }

    /// URL without its query string, safe to log.
    #[must_use]
    pub fn redacted_url(&self) -> &str {
        self.url.split_once('?').map_or(self.url.as_str(), |(path, _)| path)
    }
}

/// Retrying JSON dispatcher over an injected [`Transport`].
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Dispatcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// POST `payload` to `endpoint` and decode the success body as `R`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnexpectedShape`] when the success body does
    /// not decode as `R`, and the errors of [`Dispatcher::call_raw`] otherwise.
    pub async fn call<R, P>(&self, endpoint: &Endpoint, payload: &P) -> Result<R, DispatchError>
    where
        R: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let body = self.call_raw(endpoint, payload).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(endpoint = %endpoint.name, error = %e, "dispatch: response did not match expected shape");
            DispatchError::UnexpectedShape(e.to_string())
        })
    }

    /// POST `payload` to `endpoint` and return the success body text.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Encode`] if the payload cannot be serialized.
    /// - [`DispatchError::Status`] on the first non-retryable status.
    /// - [`DispatchError::Exhausted`] when every attempt failed transiently.
    pub async fn call_raw<P>(&self, endpoint: &Endpoint, payload: &P) -> Result<String, DispatchError>
    where
        P: Serialize + ?Sized,
    {
        let body = serde_json::to_value(payload).map_err(|e| DispatchError::Encode(e.to_string()))?;
        let max_attempts = self.policy.max_attempts();
        let mut state = RetryState::Idle.start();

        loop {
            let attempt = state.attempt().unwrap_or_default();

            debug!(endpoint = %endpoint.name, url = endpoint.redacted_url(), attempt, "dispatch: sending");
            let result = self.attempt(endpoint, &body).await;
            let outcome = match &result {
                Ok(_) => AttemptOutcome::Succeeded,
                Err(e) if e.retryable() => AttemptOutcome::Transient,
                Err(_) => AttemptOutcome::Terminal,
            };

            match state.advance(outcome, &self.policy) {
                Transition::Retry { next, delay } => {
                    if let Err(e) = &result {
                        warn!(
                            endpoint = %endpoint.name,
                            error = %e,
                            attempt = attempt + 1,
                            max_attempts,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "dispatch: transient failure; retrying"
                        );
                    }
                    tokio::time::sleep(delay).await;
                    state = next;
                }
                Transition::Finished(RetryState::Success) => {
                    info!(endpoint = %endpoint.name, attempts = attempt + 1, "dispatch: ok");
                    return result;
                }
                Transition::Finished(_) => {
                    return match result {
                        Err(e) if outcome == AttemptOutcome::Transient => {
                            warn!(endpoint = %endpoint.name, error = %e, attempts = attempt + 1, "dispatch: retries exhausted");
                            Err(DispatchError::Exhausted { attempts: attempt + 1, last: Box::new(e) })
                        }
                        Err(e) => {
                            warn!(endpoint = %endpoint.name, error = %e, "dispatch: terminal failure");
                            Err(e)
                        }
                        Ok(body) => Ok(body),
                    };
                }
            }
        }
    }

    async fn attempt(&self, endpoint: &Endpoint, body: &serde_json::Value) -> Result<String, DispatchError> {
        let timeout = self.policy.attempt_timeout();
        let response = tokio::time::timeout(timeout, self.transport.post_json(&endpoint.url, body))
            .await
            .map_err(|_| TransportError::Timeout)??;

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(DispatchError::Status { status: response.status, body: truncate(&response.body) })
        }
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;
