//! Overall time limit for one analysis pass.

use std::time::Duration;
use tokio::time::Instant;

/// Point in time after which no new enrichment call starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// No limit.
    pub fn none() -> Self {
        Self { at: None }
    }

    /// Deadline `limit` from now, or unbounded for `None`.
    pub fn after(limit: Option<Duration>) -> Self {
        Self {
            at: limit.map(|d| Instant::now() + d),
        }
    }

    /// Time left, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Budget for one call: the smaller of `timeout` and the time left.
    ///
    /// Returns `None` once the deadline has passed.
    pub fn budget(&self, timeout: Duration) -> Option<Duration> {
        match self.remaining() {
            None => Some(timeout),
            Some(left) if left.is_zero() => None,
            Some(left) => Some(left.min(timeout)),
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
