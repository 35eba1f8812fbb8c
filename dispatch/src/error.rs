//! Dispatch error taxonomy: transient vs. terminal.

use crate::transport::TransportError;

/// Grepable error codes plus the retry classification used across crates.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Errors surfaced by [`crate::Dispatcher`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The request never produced an HTTP response (connect failure, reset, timeout).
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The endpoint answered with a non-success status.
    #[error("request failed with status {status}")]
    Status { status: u16, body: String },

    /// Every allowed attempt failed transiently.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<DispatchError> },

    /// A success response did not carry the expected fields.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// The request payload could not be serialized.
    #[error("request encode failed: {0}")]
    Encode(String),
}

impl DispatchError {
    /// Last HTTP status observed, looking through retry exhaustion.
    #[must_use]
    pub fn last_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Exhausted { last, .. } => last.last_status(),
            _ => None,
        }
    }
}

impl ErrorCode for DispatchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(TransportError::Timeout) => "E_TIMEOUT",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Status { .. } => "E_STATUS",
            Self::Exhausted { .. } => "E_RETRIES_EXHAUSTED",
            Self::UnexpectedShape(_) => "E_UNEXPECTED_SHAPE",
            Self::Encode(_) => "E_ENCODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
