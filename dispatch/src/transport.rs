//! Network seam for the dispatcher.
//!
//! A transport performs exactly one HTTP exchange and never retries. The
//! dispatcher owns retry and timeout policy, so a transport only has to map
//! its own failures onto [`TransportError`].

use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Slack the client-wide timeout allows past one attempt's limit.
const BACKSTOP_MARGIN: Duration = Duration::from_secs(5);

/// Status and body text of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure before any HTTP status was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

/// One-shot JSON POST. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON to `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if no response was received.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<RawResponse, TransportError>;
}

// =============================================================================
// REQWEST
// =============================================================================

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the given connect timeout. The client-wide
    /// request timeout is a backstop derived from `attempt_timeout`, so the
    /// dispatcher's per-attempt limit always fires first.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialised.
    pub fn new(connect_timeout: Duration, attempt_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(backstop_timeout(attempt_timeout))
            .build()?;
        Ok(Self { http })
    }
}

fn backstop_timeout(attempt_timeout: Duration) -> Duration {
    attempt_timeout.saturating_add(BACKSTOP_MARGIN)
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<RawResponse, TransportError> {
        let response = self.http.post(url).json(body).send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(RawResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        // reqwest includes the full URL in its message; API keys live in the query.
        TransportError::Network(e.without_url().to_string())
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
