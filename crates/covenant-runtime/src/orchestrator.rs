//! Concurrent analysis orchestrator.
//!
//! The orchestrator runs the same pass as `covenant_core::ContractAnalyzer`
//! with async enrichment:
//! - Every clause is classified up front, before any generator runs
//! - Up to `max_concurrency` clauses are enriched at once, and the three
//!   generators of one clause run together via `tokio::join!`
//! - Each generator call has a circuit breaker, a timeout and retry with
//!   backoff for transient errors
//! - Results are reassembled in document order regardless of completion order
//! - Under `Propagate` the first failing clause stops the pass; clauses
//!   before it are returned inside the error

use std::future::Future;
use std::path::Path;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use thiserror::Error;

use covenant_core::{
    extract_text, Clause, ClauseAnalysis, Contract, ContractReport, DefaultEnrichment,
    Degradation, EnrichmentError, EnrichmentKind, ExtractError, FailurePolicy, PatternSegmenter,
    RiskClassifier, Segmenter,
};

use crate::cache::{ClauseKey, EnrichmentCache};
use crate::config::{ConfigError, RuntimeConfig};
use crate::providers::{AsyncEnrichmentProvider, Blocking};
use crate::resilience::{backoff, CircuitBreaker, Deadline};

/// Why a single generator call produced no records.
#[derive(Error, Debug, Clone)]
pub enum CallFailure {
    #[error(transparent)]
    Provider(#[from] EnrichmentError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("circuit open")]
    CircuitOpen,

    #[error("analysis deadline exceeded")]
    DeadlineExceeded,
}

/// Errors from the runtime orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("{kind} failed for {clause_id}: {source}")]
    Enrichment {
        clause_id: String,
        kind: EnrichmentKind,
        #[source]
        source: CallFailure,
        /// Clauses analyzed before the failing one, in document order
        partial: Box<RuntimeResult>,
    },

    #[error("Extraction task failed: {0}")]
    Task(String),
}

impl RuntimeError {
    /// The report accumulated before a propagated enrichment failure.
    pub fn partial(&self) -> Option<&RuntimeResult> {
        match self {
            RuntimeError::Enrichment { partial, .. } => Some(&**partial),
            _ => None,
        }
    }
}

/// Result from one orchestrated analysis pass.
#[derive(Debug, Clone)]
pub struct RuntimeResult {
    pub report: ContractReport,

    /// Annotation lists emptied under the degrade policy
    pub degradations: Vec<Degradation>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RuntimeResult {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

struct ClauseOutcome {
    analysis: ClauseAnalysis,
    degradations: Vec<Degradation>,
}

/// A propagated call failure, before the partial report is attached.
struct ClauseFailure {
    clause_id: String,
    kind: EnrichmentKind,
    source: CallFailure,
}

/// Runs classification and concurrent enrichment over contracts.
pub struct AnalysisOrchestrator {
    segmenter: Arc<dyn Segmenter>,
    classifier: Arc<dyn RiskClassifier>,
    provider: Arc<dyn AsyncEnrichmentProvider>,
    config: RuntimeConfig,
    circuit_breaker: CircuitBreaker,
    cache: Option<EnrichmentCache>,
}

impl AnalysisOrchestrator {
    /// Orchestrator with default strategies and the given config.
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> AnalysisOrchestratorBuilder {
        AnalysisOrchestratorBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    pub fn cache(&self) -> Option<&EnrichmentCache> {
        self.cache.as_ref()
    }

    /// Analyze every clause of the contract.
    ///
    /// Overwrites each clause's risk. Report entries follow the contract's
    /// clause order even when enrichment completes out of order.
    pub async fn analyze(&self, contract: &mut Contract) -> Result<RuntimeResult, RuntimeError> {
        let started_at = Utc::now();
        let deadline = Deadline::after(self.config.deadline);

        for clause in contract.clauses.iter_mut() {
            clause.risk = self.classifier.classify(&clause.content);
            tracing::debug!(
                clause_id = %clause.id,
                risk = %clause.risk,
                classifier = self.classifier.name(),
                "Clause classified"
            );
        }

        let contract = &*contract;
        let mut outcomes = pin!(stream::iter(&contract.clauses)
            .map(|clause| self.analyze_clause(clause, deadline))
            .buffered(self.config.max_concurrency));

        let mut report = ContractReport::new(contract);
        let mut degradations = Vec::new();
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Ok(outcome) => {
                    report.analysis.push(outcome.analysis);
                    degradations.extend(outcome.degradations);
                }
                Err(failure) => {
                    tracing::debug!(
                        clause_id = %failure.clause_id,
                        completed = report.analysis.len(),
                        "Analysis stopped, returning partial report"
                    );
                    return Err(RuntimeError::Enrichment {
                        clause_id: failure.clause_id,
                        kind: failure.kind,
                        source: failure.source,
                        partial: Box::new(RuntimeResult {
                            report,
                            degradations,
                            started_at,
                            finished_at: Utc::now(),
                        }),
                    });
                }
            }
        }

        let finished_at = Utc::now();
        let summary = report.risk_summary();
        tracing::info!(
            contract_id = %report.contract_id,
            clauses = report.analysis.len(),
            high = summary.high,
            medium = summary.medium,
            low = summary.low,
            degraded = degradations.len(),
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "Contract analysis complete"
        );

        Ok(RuntimeResult {
            report,
            degradations,
            started_at,
            finished_at,
        })
    }

    /// Segment and analyze raw contract text.
    pub async fn analyze_text<I, S>(
        &self,
        id: impl Into<String>,
        title: impl Into<String>,
        parties: I,
        text: &str,
    ) -> Result<RuntimeResult, RuntimeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut contract =
            Contract::from_candidates(id, title, parties, self.segmenter.segment(text));
        self.analyze(&mut contract).await
    }

    /// Extract a PDF or DOCX document off the async workers, then analyze it.
    pub async fn process_document(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<RuntimeResult, RuntimeError> {
        let path = path.as_ref().to_path_buf();
        let text = tokio::task::spawn_blocking({
            let path = path.clone();
            move || extract_text(&path)
        })
        .await
        .map_err(|e| RuntimeError::Task(e.to_string()))??;

        let mut contract = Contract::for_document(&path, self.segmenter.segment(&text));
        tracing::info!(
            path = %path.display(),
            clauses = contract.clauses.len(),
            "Processing document"
        );

        self.analyze(&mut contract).await
    }

    async fn analyze_clause(
        &self,
        clause: &Clause,
        deadline: Deadline,
    ) -> Result<ClauseOutcome, ClauseFailure> {
        let key = ClauseKey::new(clause);
        if let Some(cache) = &self.cache {
            if let Some(analysis) = cache.get(&key).await {
                tracing::trace!(clause_id = %clause.id, "Cache hit");
                return Ok(ClauseOutcome {
                    analysis,
                    degradations: Vec::new(),
                });
            }
        }

        let provider = &self.provider;
        let (edits, arguments, references) = tokio::join!(
            self.call(EnrichmentKind::EditSuggestions, clause, deadline, move || {
                provider.suggest_edits(clause)
            }),
            self.call(EnrichmentKind::CounterpartyArguments, clause, deadline, move || {
                provider.counterparty_arguments(clause)
            }),
            self.call(EnrichmentKind::LegalReferences, clause, deadline, move || {
                provider.legal_references(clause)
            }),
        );

        let mut degradations = Vec::new();
        let mut analysis = ClauseAnalysis::for_clause(clause);
        analysis.edit_suggestions =
            self.settle(clause, EnrichmentKind::EditSuggestions, edits, &mut degradations)?;
        analysis.counterparty_arguments = self.settle(
            clause,
            EnrichmentKind::CounterpartyArguments,
            arguments,
            &mut degradations,
        )?;
        analysis.legal_references =
            self.settle(clause, EnrichmentKind::LegalReferences, references, &mut degradations)?;

        if degradations.is_empty() {
            if let Some(cache) = &self.cache {
                cache.insert(key, analysis.clone()).await;
            }
        }

        Ok(ClauseOutcome {
            analysis,
            degradations,
        })
    }

    /// One generator call with circuit breaker, deadline, timeout and retry.
    ///
    /// The timeout covers the call and all of its retries.
    async fn call<T, F, Fut>(
        &self,
        kind: EnrichmentKind,
        clause: &Clause,
        deadline: Deadline,
        generate: F,
    ) -> Result<Vec<T>, CallFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<T>, EnrichmentError>>,
    {
        if self.circuit_breaker.is_open(kind) {
            return Err(CallFailure::CircuitOpen);
        }

        let timeout = self.config.enrichment_timeout;
        let budget = deadline
            .budget(timeout)
            .ok_or(CallFailure::DeadlineExceeded)?;

        let attempts = generate
            .retry(backoff(&self.config.retry))
            .when(EnrichmentError::is_transient)
            .notify(|err: &EnrichmentError, delay: Duration| {
                tracing::debug!(
                    clause_id = %clause.id,
                    kind = %kind,
                    error = %err,
                    delay = ?delay,
                    "Retrying enrichment"
                );
            });

        let result = match tokio::time::timeout(budget, attempts).await {
            Ok(result) => result.map_err(CallFailure::from),
            Err(_) if budget < timeout => Err(CallFailure::DeadlineExceeded),
            Err(_) => Err(CallFailure::Timeout(timeout)),
        };

        match &result {
            Ok(_) => self.circuit_breaker.record_success(kind),
            Err(CallFailure::DeadlineExceeded) => {}
            Err(_) => self.circuit_breaker.record_failure(kind),
        }

        result
    }

    /// Apply the failure policy to one generator result.
    fn settle<T>(
        &self,
        clause: &Clause,
        kind: EnrichmentKind,
        result: Result<Vec<T>, CallFailure>,
        degradations: &mut Vec<Degradation>,
    ) -> Result<Vec<T>, ClauseFailure> {
        match result {
            Ok(records) => Ok(records),
            Err(source) => match self.config.failure_policy {
                FailurePolicy::Propagate => Err(ClauseFailure {
                    clause_id: clause.id.clone(),
                    kind,
                    source,
                }),
                FailurePolicy::Degrade => {
                    tracing::warn!(
                        clause_id = %clause.id,
                        kind = %kind,
                        provider = self.provider.name(),
                        error = %source,
                        "Enrichment failed, degrading to empty list"
                    );
                    degradations.push(Degradation {
                        clause_id: clause.id.clone(),
                        kind,
                        reason: source.to_string(),
                    });
                    Ok(Vec::new())
                }
            },
        }
    }
}

/// Builder for AnalysisOrchestrator.
#[derive(Default)]
pub struct AnalysisOrchestratorBuilder {
    config: RuntimeConfig,
    segmenter: Option<Arc<dyn Segmenter>>,
    classifier: Option<Arc<dyn RiskClassifier>>,
    provider: Option<Arc<dyn AsyncEnrichmentProvider>>,
}

impl AnalysisOrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn segmenter(mut self, segmenter: impl Segmenter + 'static) -> Self {
        self.segmenter = Some(Arc::new(segmenter));
        self
    }

    /// Replace the classifier built from `config.classifier`.
    pub fn classifier(mut self, classifier: impl RiskClassifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    pub fn provider(mut self, provider: impl AsyncEnrichmentProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Validate the config and build the orchestrator.
    ///
    /// Unset strategies fall back to the pattern segmenter, a keyword
    /// classifier from `config.classifier` and the default enrichment.
    pub fn build(self) -> Result<AnalysisOrchestrator, RuntimeError> {
        self.config.validate()?;

        let classifier = self
            .classifier
            .unwrap_or_else(|| Arc::new(self.config.classifier.build()));
        let segmenter = self
            .segmenter
            .unwrap_or_else(|| Arc::new(PatternSegmenter::new()));
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(Blocking::new(DefaultEnrichment::new())));

        Ok(AnalysisOrchestrator {
            segmenter,
            classifier,
            provider,
            circuit_breaker: CircuitBreaker::new(self.config.circuit_breaker.clone()),
            cache: EnrichmentCache::from_config(&self.config.cache),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::{analyze_text, RiskLevel};

    const SAMPLE: &str = "1. The Supplier may terminate this Agreement upon breach. \
                          2. The parties may amend this Agreement by written consent. \
                          3. Invoices are payable within thirty days.";

    #[tokio::test]
    async fn test_default_orchestrator_matches_core() {
        let orchestrator = AnalysisOrchestrator::new(RuntimeConfig::default()).unwrap();

        let result = orchestrator
            .analyze_text("contract_1", "sample", ["A", "B"], SAMPLE)
            .await
            .unwrap();
        let expected = analyze_text("contract_1", "sample", ["A", "B"], SAMPLE).unwrap();

        assert_eq!(result.report, expected);
        assert!(!result.is_degraded());
        assert!(result.finished_at >= result.started_at);
    }

    #[tokio::test]
    async fn test_classification_written_back() {
        let orchestrator = AnalysisOrchestrator::new(RuntimeConfig::default()).unwrap();
        let mut contract = Contract::from_candidates(
            "c",
            "t",
            ["A"],
            PatternSegmenter::new().segment(SAMPLE),
        );

        orchestrator.analyze(&mut contract).await.unwrap();

        let risks: Vec<RiskLevel> = contract.clauses.iter().map(|c| c.risk).collect();
        assert_eq!(risks, vec![RiskLevel::High, RiskLevel::Medium, RiskLevel::Low]);
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let config = RuntimeConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(
            AnalysisOrchestrator::new(config),
            Err(RuntimeError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_filled_after_clean_run() {
        let orchestrator = AnalysisOrchestrator::new(RuntimeConfig::default()).unwrap();
        orchestrator
            .analyze_text("c", "t", ["A"], SAMPLE)
            .await
            .unwrap();

        let cache = orchestrator.cache().unwrap();
        cache.sync().await;
        assert_eq!(cache.entry_count(), 3);
    }
}
