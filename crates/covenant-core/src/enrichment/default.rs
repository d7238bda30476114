//! Placeholder enrichment.
//!
//! Stands in for a language model and a legal database. The annotations are
//! fixed text chosen by risk tier:
//!
//! | Tier | Suggestions | Arguments | References |
//! |------|-------------|-----------|------------|
//! | HIGH | 1 | 1 strong | 1 |
//! | MEDIUM | none | 1 moderate | 1 |
//! | LOW | none | none | 1 |

use crate::types::{
    ArgumentStrength, Clause, CounterPartyArgument, EditSuggestion, LegalReference, RiskLevel,
};

use super::{EnrichmentError, EnrichmentProvider};

const UCC_2_207_URL: &str = "https://www.law.cornell.edu/ucc/2/2-207";

/// Deterministic placeholder provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEnrichment;

impl DefaultEnrichment {
    pub fn new() -> Self {
        Self
    }
}

impl EnrichmentProvider for DefaultEnrichment {
    fn name(&self) -> &str {
        "default"
    }

    fn suggest_edits(&self, clause: &Clause) -> Result<Vec<EditSuggestion>, EnrichmentError> {
        if !clause.risk.is_high() {
            return Ok(vec![]);
        }

        Ok(vec![EditSuggestion {
            id: format!("suggestion_{}_1", clause.id),
            clause_id: clause.id.clone(),
            original: clause.content.clone(),
            suggested: format!("Consider revising: {}", clause.content),
            reasoning: "High risk clause that may expose to liability".to_string(),
            impact: "Reduces legal exposure".to_string(),
        }])
    }

    fn counterparty_arguments(
        &self,
        clause: &Clause,
    ) -> Result<Vec<CounterPartyArgument>, EnrichmentError> {
        let (argument, strength) = match clause.risk {
            RiskLevel::High => (
                "This clause is industry standard and shouldn't be modified.",
                ArgumentStrength::Strong,
            ),
            RiskLevel::Medium => (
                "We can discuss minor modifications but the core terms must remain.",
                ArgumentStrength::Moderate,
            ),
            RiskLevel::Low => return Ok(vec![]),
        };

        Ok(vec![CounterPartyArgument {
            id: format!("argument_{}_1", clause.id),
            clause_id: clause.id.clone(),
            argument: argument.to_string(),
            strength,
        }])
    }

    fn legal_references(&self, clause: &Clause) -> Result<Vec<LegalReference>, EnrichmentError> {
        Ok(vec![LegalReference {
            id: format!("reference_{}_1", clause.id),
            clause_id: clause.id.clone(),
            source: "General Contract Law".to_string(),
            citation: "Section 2-207 of the UCC".to_string(),
            relevance: "Provides context for contract formation and modification".to_string(),
            url: Some(UCC_2_207_URL.to_string()),
        }])
    }
}
