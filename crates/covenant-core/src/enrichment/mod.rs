//! Enrichment providers.
//!
//! An enrichment provider annotates a classified clause with edit
//! suggestions, simulated counterparty arguments and legal references.
//! Providers are keyed by clause: every record they return carries the
//! originating `clause_id`.
//!
//! ## Isolation Contract
//!
//! - Each method is a pure function of the clause it receives
//! - No shared mutable state between the three methods
//! - Methods may be called in any order, or concurrently

mod default;

pub use default::DefaultEnrichment;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Clause, CounterPartyArgument, EditSuggestion, LegalReference};

/// Errors from enrichment providers.
#[derive(Error, Debug, Clone)]
pub enum EnrichmentError {
    /// Transient failure; callers may retry.
    #[error("Enrichment service unavailable: {0}")]
    Unavailable(String),

    #[error("Clause {clause_id} cannot be enriched: {reason}")]
    InvalidClause { clause_id: String, reason: String },

    #[error("Enrichment provider failed: {0}")]
    Provider(String),
}

impl EnrichmentError {
    pub fn is_transient(&self) -> bool {
        matches!(self, EnrichmentError::Unavailable(_))
    }
}

/// The three annotation kinds attached to a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentKind {
    EditSuggestions,
    CounterpartyArguments,
    LegalReferences,
}

impl EnrichmentKind {
    pub const ALL: [EnrichmentKind; 3] = [
        EnrichmentKind::EditSuggestions,
        EnrichmentKind::CounterpartyArguments,
        EnrichmentKind::LegalReferences,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentKind::EditSuggestions => "edit_suggestions",
            EnrichmentKind::CounterpartyArguments => "counterparty_arguments",
            EnrichmentKind::LegalReferences => "legal_references",
        }
    }
}

impl fmt::Display for EnrichmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability interface with one method per annotation kind.
///
/// The clause passed in has already been risk-classified.
pub trait EnrichmentProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Proposed rewrites. Should be empty for LOW-risk clauses.
    fn suggest_edits(&self, clause: &Clause) -> Result<Vec<EditSuggestion>, EnrichmentError>;

    /// Objections the counterparty is likely to raise.
    fn counterparty_arguments(
        &self,
        clause: &Clause,
    ) -> Result<Vec<CounterPartyArgument>, EnrichmentError>;

    /// Supporting citations. Each must carry a source and citation.
    fn legal_references(&self, clause: &Clause) -> Result<Vec<LegalReference>, EnrichmentError>;
}

impl<P: EnrichmentProvider + ?Sized> EnrichmentProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn suggest_edits(&self, clause: &Clause) -> Result<Vec<EditSuggestion>, EnrichmentError> {
        (**self).suggest_edits(clause)
    }

    fn counterparty_arguments(
        &self,
        clause: &Clause,
    ) -> Result<Vec<CounterPartyArgument>, EnrichmentError> {
        (**self).counterparty_arguments(clause)
    }

    fn legal_references(&self, clause: &Clause) -> Result<Vec<LegalReference>, EnrichmentError> {
        (**self).legal_references(clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_match_report_fields() {
        let names: Vec<&str> = EnrichmentKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            ["edit_suggestions", "counterparty_arguments", "legal_references"]
        );
        assert_eq!(
            serde_json::to_string(&EnrichmentKind::LegalReferences).unwrap(),
            "\"legal_references\""
        );
    }

    #[test]
    fn test_only_unavailable_is_transient() {
        assert!(EnrichmentError::Unavailable("503".into()).is_transient());
        assert!(!EnrichmentError::Provider("bad".into()).is_transient());
    }
}
