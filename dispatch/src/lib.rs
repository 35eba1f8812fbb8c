//! Resilient outbound JSON dispatch for third-party HTTP APIs.
//!
//! This crate owns the retry contract shared by every external call made by
//! `plantdoc`: one POST per attempt, transient failures (transport errors,
//! 429, 5xx) retried with exponential backoff, everything else surfaced
//! immediately as a terminal error.
//!
//! DESIGN
//! ======
//! - [`policy`] is pure: the backoff schedule and the `Idle → Attempting(n) →
//!   Success | Failed` state machine know nothing about HTTP or timers.
//! - [`transport`] is the network seam. Production uses reqwest; tests inject
//!   scripted transports through the same trait; [`testing`] holds the
//!   shared one behind the `test-util` feature.
//! - [`dispatcher`] drives the state machine against a transport and owns
//!   sleeping and per-attempt timeouts.

pub mod dispatcher;
pub mod error;
pub mod policy;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod transport;

pub use dispatcher::{Dispatcher, Endpoint};
pub use error::{DispatchError, ErrorCode};
pub use policy::{AttemptOutcome, RetryPolicy, RetryState, Transition};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
