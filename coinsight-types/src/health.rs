//! Provider health reporting types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Observable circuit-breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CircuitState {
    /// Requests flow normally.
    Closed,
    /// Requests are skipped until the cooldown elapses.
    Open {
        /// Milliseconds since the circuit opened.
        open_for_ms: u64,
        /// Milliseconds until the next attempt is admitted.
        reset_in_ms: u64,
    },
}

impl CircuitState {
    /// True when the breaker is open.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("closed"),
            Self::Open { reset_in_ms, .. } => write!(f, "open (reset in {reset_in_ms}ms)"),
        }
    }
}

/// Point-in-time health of one provider, as exposed to observability endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Provider name.
    pub provider: String,
    /// Static priority from configuration.
    pub priority: u32,
    /// Requests counted in the current window.
    pub requests_in_window: u32,
    /// Configured window budget.
    pub max_requests: u32,
    /// Current failure streak: the larger of `backoff_failures` and
    /// `circuit_failures`. Any non-zero value demotes the provider in ordering.
    pub consecutive_failures: u32,
    /// Failures driving the rate-limiter backoff, upstream 429s included.
    /// Cleared by the periodic counter reset.
    pub backoff_failures: u32,
    /// Outage failures counted by the circuit breaker since its last success.
    pub circuit_failures: u32,
    /// Current breaker state.
    pub circuit_state: CircuitState,
    /// Milliseconds until the rate-limiter backoff elapses; zero when none.
    pub backoff_remaining_ms: u64,
}

/// Breaker counters aggregated over every registered provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStats {
    /// Registered providers.
    pub providers: usize,
    /// Breakers currently open.
    pub open: usize,
    /// Closed breakers with a non-zero failure count.
    pub failing: usize,
    /// Times any breaker has opened since startup.
    pub trips: u64,
}
