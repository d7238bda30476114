//! Contract aggregation: drives the per-clause analysis pass.
//!
//! For each clause, in document order:
//! 1. Classify risk, overwriting the clause's risk field
//! 2. Invoke the three enrichment generators
//! 3. Assemble a [`ClauseAnalysis`]
//!
//! Generator failures are handled by an explicit [`FailurePolicy`]. There is
//! no rollback: under `Propagate` the pass stops at the first failure and the
//! caller receives the typed error together with the clauses finished so far.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::{KeywordClassifier, RiskClassifier};
use crate::enrichment::{DefaultEnrichment, EnrichmentError, EnrichmentKind, EnrichmentProvider};
use crate::types::{Clause, ClauseAnalysis, Contract, ContractReport};

/// What to do when an enrichment generator fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Replace the failed list with an empty one and continue
    #[default]
    Degrade,

    /// Abort the pass with the generator's error
    Propagate,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "degrade" => Ok(FailurePolicy::Degrade),
            "propagate" => Ok(FailurePolicy::Propagate),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

/// An annotation list that was emptied because its generator failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degradation {
    pub clause_id: String,
    pub kind: EnrichmentKind,
    pub reason: String,
}

/// Errors from an analysis pass.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{kind} failed for {clause_id}: {source}")]
    Enrichment {
        clause_id: String,
        kind: EnrichmentKind,
        #[source]
        source: EnrichmentError,
        /// Clauses analyzed before the failing one, in document order
        partial: Box<AnalysisOutcome>,
    },
}

impl AnalysisError {
    /// The report and degradations accumulated before the pass stopped.
    pub fn partial(&self) -> &AnalysisOutcome {
        match self {
            AnalysisError::Enrichment { partial, .. } => &**partial,
        }
    }
}

/// A propagated generator failure, before the partial report is attached.
type Unsettled = (EnrichmentKind, EnrichmentError);

/// Report plus the degradations recorded while building it.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: ContractReport,
    pub degradations: Vec<Degradation>,
}

impl AnalysisOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// Drives classification and enrichment over a contract.
pub struct ContractAnalyzer {
    classifier: Box<dyn RiskClassifier>,
    provider: Box<dyn EnrichmentProvider>,
    policy: FailurePolicy,
}

impl ContractAnalyzer {
    pub fn new() -> Self {
        Self {
            classifier: Box::new(KeywordClassifier::new()),
            provider: Box::new(DefaultEnrichment::new()),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: impl RiskClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_provider(mut self, provider: impl EnrichmentProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Analyze every clause of the contract.
    ///
    /// Each clause's risk field is overwritten by the classifier before any
    /// generator sees the clause.
    pub fn analyze(&self, contract: &mut Contract) -> Result<AnalysisOutcome, AnalysisError> {
        let mut report = ContractReport::new(contract);
        let mut degradations = Vec::new();

        for clause in contract.clauses.iter_mut() {
            clause.risk = self.classifier.classify(&clause.content);
            tracing::debug!(
                clause_id = %clause.id,
                risk = %clause.risk,
                classifier = self.classifier.name(),
                "Clause classified"
            );

            match self.analyze_clause(clause, &mut degradations) {
                Ok(analysis) => report.analysis.push(analysis),
                Err((kind, source)) => {
                    return Err(AnalysisError::Enrichment {
                        clause_id: clause.id.clone(),
                        kind,
                        source,
                        partial: Box::new(AnalysisOutcome {
                            report,
                            degradations,
                        }),
                    });
                }
            }
        }

        let summary = report.risk_summary();
        tracing::info!(
            contract_id = %report.contract_id,
            clauses = report.analysis.len(),
            high = summary.high,
            medium = summary.medium,
            low = summary.low,
            degraded = degradations.len(),
            "Contract analysis complete"
        );

        Ok(AnalysisOutcome {
            report,
            degradations,
        })
    }

    fn analyze_clause(
        &self,
        clause: &Clause,
        degradations: &mut Vec<Degradation>,
    ) -> Result<ClauseAnalysis, Unsettled> {
        let mut analysis = ClauseAnalysis::for_clause(clause);

        analysis.edit_suggestions = self.settle(
            clause,
            EnrichmentKind::EditSuggestions,
            self.provider.suggest_edits(clause),
            degradations,
        )?;
        analysis.counterparty_arguments = self.settle(
            clause,
            EnrichmentKind::CounterpartyArguments,
            self.provider.counterparty_arguments(clause),
            degradations,
        )?;
        analysis.legal_references = self.settle(
            clause,
            EnrichmentKind::LegalReferences,
            self.provider.legal_references(clause),
            degradations,
        )?;

        Ok(analysis)
    }

    /// Apply the failure policy to one generator result.
    fn settle<T>(
        &self,
        clause: &Clause,
        kind: EnrichmentKind,
        result: Result<Vec<T>, EnrichmentError>,
        degradations: &mut Vec<Degradation>,
    ) -> Result<Vec<T>, Unsettled> {
        match result {
            Ok(records) => Ok(records),
            Err(source) => match self.policy {
                FailurePolicy::Propagate => Err((kind, source)),
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

impl Default for ContractAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ClauseCandidate, CounterPartyArgument, EditSuggestion, LegalReference, RiskLevel,
    };

    /// Fails every reference lookup; other kinds use the default provider.
    struct FailingReferences;

    impl EnrichmentProvider for FailingReferences {
        fn name(&self) -> &str {
            "failing-references"
        }

        fn suggest_edits(&self, clause: &Clause) -> Result<Vec<EditSuggestion>, EnrichmentError> {
            DefaultEnrichment.suggest_edits(clause)
        }

        fn counterparty_arguments(
            &self,
            clause: &Clause,
        ) -> Result<Vec<CounterPartyArgument>, EnrichmentError> {
            DefaultEnrichment.counterparty_arguments(clause)
        }

        fn legal_references(
            &self,
            _clause: &Clause,
        ) -> Result<Vec<LegalReference>, EnrichmentError> {
            Err(EnrichmentError::Unavailable("legal database offline".into()))
        }
    }

    /// Fails reference lookups for a single clause only.
    struct FailsOn(&'static str);

    impl EnrichmentProvider for FailsOn {
        fn name(&self) -> &str {
            "fails-on"
        }

        fn suggest_edits(&self, clause: &Clause) -> Result<Vec<EditSuggestion>, EnrichmentError> {
            DefaultEnrichment.suggest_edits(clause)
        }

        fn counterparty_arguments(
            &self,
            clause: &Clause,
        ) -> Result<Vec<CounterPartyArgument>, EnrichmentError> {
            DefaultEnrichment.counterparty_arguments(clause)
        }

        fn legal_references(&self, clause: &Clause) -> Result<Vec<LegalReference>, EnrichmentError> {
            if clause.id == self.0 {
                return Err(EnrichmentError::Provider("boom".into()));
            }
            DefaultEnrichment.legal_references(clause)
        }
    }

    struct AlwaysLow;

    impl RiskClassifier for AlwaysLow {
        fn name(&self) -> &str {
            "always-low"
        }

        fn classify(&self, _content: &str) -> RiskLevel {
            RiskLevel::Low
        }
    }

    fn contract(contents: &[&str]) -> Contract {
        let candidates = contents
            .iter()
            .enumerate()
            .map(|(i, c)| ClauseCandidate {
                id: format!("clause_{}", i + 1),
                title: format!("Clause {}", i + 1),
                content: c.to_string(),
                start: 0,
                end: c.len(),
            })
            .collect();
        Contract::from_candidates("contract_1", "msa.docx", ["A", "B"], candidates)
    }

    #[test]
    fn test_risk_overwritten_in_place() {
        let mut contract = contract(&["1. Either party may terminate.", "2. Fees are fixed."]);
        ContractAnalyzer::new().analyze(&mut contract).unwrap();

        assert_eq!(contract.clauses[0].risk, RiskLevel::High);
        assert_eq!(contract.clauses[1].risk, RiskLevel::Low);
    }

    #[test]
    fn test_report_carries_contract_identity() {
        let mut contract = contract(&["1. Fees are fixed."]);
        let outcome = ContractAnalyzer::new().analyze(&mut contract).unwrap();

        assert_eq!(outcome.report.contract_id, "contract_1");
        assert_eq!(outcome.report.contract_title, "msa.docx");
        assert_eq!(outcome.report.analysis[0].clause_title, "Clause 1");
        assert!(!outcome.is_degraded());
    }

    #[test]
    fn test_empty_contract_yields_empty_analysis() {
        let mut contract = contract(&[]);
        let outcome = ContractAnalyzer::new().analyze(&mut contract).unwrap();
        assert!(outcome.report.analysis.is_empty());
    }

    #[test]
    fn test_degrade_policy_empties_failed_list() {
        let mut contract = contract(&["1. Liability is unlimited.", "2. Renewal is automatic."]);
        let outcome = ContractAnalyzer::new()
            .with_provider(FailingReferences)
            .analyze(&mut contract)
            .unwrap();

        assert_eq!(outcome.report.analysis.len(), 2);
        for analysis in &outcome.report.analysis {
            assert!(analysis.legal_references.is_empty());
            assert_eq!(analysis.counterparty_arguments.len(), 1);
        }
        assert_eq!(outcome.degradations.len(), 2);
        assert_eq!(outcome.degradations[0].kind, EnrichmentKind::LegalReferences);
        assert_eq!(outcome.degradations[1].clause_id, "clause_2");
    }

    #[test]
    fn test_propagate_policy_returns_typed_error() {
        let mut contract = contract(&["1. Liability is unlimited."]);
        let result = ContractAnalyzer::new()
            .with_provider(FailingReferences)
            .with_policy(FailurePolicy::Propagate)
            .analyze(&mut contract);

        match result {
            Err(AnalysisError::Enrichment {
                clause_id,
                kind,
                source,
                partial,
            }) => {
                assert_eq!(clause_id, "clause_1");
                assert_eq!(kind, EnrichmentKind::LegalReferences);
                assert!(source.is_transient());
                assert!(partial.report.analysis.is_empty());
            }
            other => panic!("expected enrichment error, got {:?}", other.map(|o| o.report)),
        }
    }

    #[test]
    fn test_propagate_keeps_earlier_clauses() {
        let mut contract = contract(&[
            "1. Liability is unlimited.",
            "2. Either party may terminate.",
            "3. Fees may change yearly.",
        ]);
        let err = ContractAnalyzer::new()
            .with_provider(FailsOn("clause_2"))
            .with_policy(FailurePolicy::Propagate)
            .analyze(&mut contract)
            .unwrap_err();

        assert_eq!(err.to_string(), "legal_references failed for clause_2: Enrichment provider failed: boom");
        let partial = err.partial();
        assert_eq!(partial.report.contract_id, "contract_1");
        assert_eq!(partial.report.analysis.len(), 1);
        assert_eq!(partial.report.analysis[0].clause_id, "clause_1");
        assert_eq!(partial.report.analysis[0].legal_references.len(), 1);
        assert!(partial.degradations.is_empty());
    }

    #[test]
    fn test_classifier_is_swappable() {
        let mut contract = contract(&["1. We may terminate upon breach."]);
        let outcome = ContractAnalyzer::new()
            .with_classifier(AlwaysLow)
            .analyze(&mut contract)
            .unwrap();

        let analysis = &outcome.report.analysis[0];
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert!(analysis.edit_suggestions.is_empty());
        assert!(analysis.counterparty_arguments.is_empty());
    }

    #[test]
    fn test_failure_policy_parses() {
        assert_eq!("Propagate".parse::<FailurePolicy>().unwrap(), FailurePolicy::Propagate);
        assert!("ignore".parse::<FailurePolicy>().is_err());
    }
}
