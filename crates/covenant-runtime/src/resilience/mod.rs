//! Resilience patterns for enrichment calls.
//!
//! - Circuit breaker per enrichment kind
//! - Retry with exponential backoff for transient failures
//! - Overall analysis deadline

mod circuit_breaker;
mod deadline;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use deadline::Deadline;
pub use retry::backoff;
