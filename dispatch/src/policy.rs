//! Retry policy — backoff schedule and attempt state machine.
//!
//! DESIGN
//! ======
//! `next_delay(n) = base * 2^n` is the whole backoff rule: no jitter, and the
//! exponent stops growing at 20. The state machine decides whether another attempt is
//! allowed; the dispatcher does the waiting.

use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_MS: u64 = 1000;
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 20;

/// Largest exponent applied to the base delay. Keeps `2^n` inside `u64`.
const MAX_BACKOFF_SHIFT: u32 = 20;

/// Attempt ceiling, backoff base, and per-attempt wall-clock limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Build a policy. A ceiling of zero is treated as one attempt.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, attempt_timeout: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay, attempt_timeout }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Delay to wait after failed attempt `attempt` (zero-based).
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let multiplier = 1_u64 << attempt.min(MAX_BACKOFF_SHIFT);
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(multiplier))
    }

    /// Sum of every backoff delay a call can spend before giving up.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1)).map(|n| self.next_delay(n)).sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_millis(DEFAULT_RETRY_BASE_MS),
            Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
        )
    }
}

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Classification of a single attempt, as seen by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Transient,
    Terminal,
}

/// Lifecycle of one dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    /// Zero-based index of the attempt in flight.
    Attempting(u32),
    Success,
    Failed,
}

/// Result of feeding an attempt outcome into [`RetryState::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Wait `delay`, then issue the attempt described by `next`.
    Retry { next: RetryState, delay: Duration },
    /// No further attempts. Holds `Success` or `Failed`.
    Finished(RetryState),
}

impl RetryState {
    /// Leave `Idle` for the first attempt. Other states are returned unchanged.
    #[must_use]
    pub fn start(self) -> Self {
        match self {
            Self::Idle => Self::Attempting(0),
            other => other,
        }
    }

    /// Apply the outcome of the current attempt.
    #[must_use]
    pub fn advance(self, outcome: AttemptOutcome, policy: &RetryPolicy) -> Transition {
        let Self::Attempting(n) = self else {
            return Transition::Finished(self);
        };

        match outcome {
            AttemptOutcome::Succeeded => Transition::Finished(Self::Success),
            AttemptOutcome::Terminal => Transition::Finished(Self::Failed),
            AttemptOutcome::Transient if n + 1 < policy.max_attempts() => {
                Transition::Retry { next: Self::Attempting(n + 1), delay: policy.next_delay(n) }
            }
            AttemptOutcome::Transient => Transition::Finished(Self::Failed),
        }
    }

    /// Zero-based index of the attempt in flight, if any.
    #[must_use]
    pub fn attempt(self) -> Option<u32> {
        match self {
            Self::Attempting(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
