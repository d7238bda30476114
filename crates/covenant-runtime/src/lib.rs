//! # covenant-runtime
//!
//! Concurrent analysis runtime for Covenant.
//!
//! `covenant-core` analyzes clauses one after another with synchronous
//! enrichment. This crate runs the same pass with async enrichment providers
//! and adds the controls a slow or remote provider needs:
//!
//! - Bounded concurrency across clauses
//! - Per-call timeouts and an overall deadline
//! - Retry with exponential backoff for transient errors
//! - A circuit breaker per enrichment kind
//! - Caching of clean clause analyses
//!
//! Classification stays deterministic and synchronous. Report order always
//! matches clause order.
//!
//! ## Example
//!
//! ```rust,ignore
//! use covenant_runtime::{AnalysisOrchestrator, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_file("covenant.yaml")?.with_env_overrides()?;
//! let orchestrator = AnalysisOrchestrator::new(config)?;
//!
//! let result = orchestrator.process_document("msa.pdf").await?;
//! for degraded in &result.degradations {
//!     eprintln!("{} {}: {}", degraded.clause_id, degraded.kind, degraded.reason);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod orchestrator;
pub mod providers;
pub mod resilience;

pub use cache::{ClauseKey, EnrichmentCache};
pub use config::{CacheConfig, ClassifierConfig, ConfigError, RetryConfig, RuntimeConfig};
pub use orchestrator::{
    AnalysisOrchestrator, AnalysisOrchestratorBuilder, CallFailure, RuntimeError, RuntimeResult,
};
pub use providers::{AsyncEnrichmentProvider, Blocking};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, Deadline};
