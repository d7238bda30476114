//! Circuit breaker for enrichment generators.
//!
//! When a generator fails repeatedly, its circuit opens and later calls of
//! that kind are degraded immediately instead of waiting on the provider.

use std::collections::HashMap;
use std::time::Duration;

use covenant_core::EnrichmentKind;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::duration_str;

/// Circuit breaker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,

    /// Time an open circuit waits before a trial call
    #[serde(with = "duration_str")]
    pub recovery_timeout: Duration,

    /// Trial successes needed to close the circuit again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 1,
        }
    }
}

/// State of one circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitState {
    Closed { failures: u32 },

    /// Calls are rejected until the recovery timeout elapses
    Open { opened_at: Instant },

    /// Trial calls are let through
    HalfOpen { successes: u32 },
}

impl Default for CircuitState {
    fn default() -> Self {
        Self::Closed { failures: 0 }
    }
}

/// Tracks one circuit per [`EnrichmentKind`].
///
/// A flaky reference lookup does not stop edit suggestions from running.
pub struct CircuitBreaker {
    states: RwLock<HashMap<EnrichmentKind, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Whether calls of this kind should be skipped.
    ///
    /// An open circuit whose recovery timeout has passed moves to half-open
    /// and lets the call through.
    pub fn is_open(&self, kind: EnrichmentKind) -> bool {
        let mut states = self.states.write();
        match states.get(&kind).cloned() {
            Some(CircuitState::Open { opened_at })
                if opened_at.elapsed() >= self.config.recovery_timeout =>
            {
                states.insert(kind, CircuitState::HalfOpen { successes: 0 });
                tracing::info!(kind = %kind, "Circuit half-open, allowing trial call");
                false
            }
            Some(CircuitState::Open { .. }) => true,
            _ => false,
        }
    }

    pub fn record_success(&self, kind: EnrichmentKind) {
        let mut states = self.states.write();
        let next = match states.get(&kind) {
            Some(CircuitState::HalfOpen { successes })
                if successes + 1 < self.config.success_threshold =>
            {
                CircuitState::HalfOpen {
                    successes: successes + 1,
                }
            }
            Some(CircuitState::HalfOpen { .. }) => {
                tracing::info!(kind = %kind, "Circuit closed after successful recovery");
                CircuitState::default()
            }
            Some(CircuitState::Open { .. }) => return,
            _ => CircuitState::default(),
        };
        states.insert(kind, next);
    }

    pub fn record_failure(&self, kind: EnrichmentKind) {
        let mut states = self.states.write();
        let next = match states.get(&kind).cloned().unwrap_or_default() {
            CircuitState::Closed { failures } if failures + 1 >= self.config.failure_threshold => {
                tracing::warn!(
                    kind = %kind,
                    failures = failures + 1,
                    "Circuit opened after repeated failures"
                );
                CircuitState::Open {
                    opened_at: Instant::now(),
                }
            }
            CircuitState::Closed { failures } => CircuitState::Closed {
                failures: failures + 1,
            },
            CircuitState::HalfOpen { .. } => {
                tracing::warn!(kind = %kind, "Circuit reopened after failed trial call");
                CircuitState::Open {
                    opened_at: Instant::now(),
                }
            }
            open @ CircuitState::Open { .. } => open,
        };
        states.insert(kind, next);
    }

    pub fn state(&self, kind: EnrichmentKind) -> CircuitState {
        self.states.read().get(&kind).cloned().unwrap_or_default()
    }

    /// Close every circuit.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
