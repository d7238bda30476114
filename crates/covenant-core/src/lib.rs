//! # covenant-core
//!
//! Deterministic clause segmentation and risk triage for contract text.
//!
//! This crate turns a flat text blob into discrete clause records, assigns
//! each a risk tier and attaches suggested edits, anticipated counterparty
//! arguments and legal references.
//!
//! ## Pipeline
//!
//! ```text
//! extract → segment → (per clause) classify → enrich → aggregate → report
//! ```
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same text always produces the same clauses and tiers
//! 2. **Document order**: report entries follow clause start offsets
//! 3. **Total classification**: every clause gets a tier, never an error
//! 4. **Swappable strategies**: segmenter, classifier and enrichment are traits
//!
//! ## Example
//!
//! ```rust,ignore
//! use covenant_core::{analyze_text, RiskLevel};
//!
//! let report = analyze_text(
//!     "contract_1",
//!     "msa.txt",
//!     ["Acme", "Globex"],
//!     "1. Acme may terminate upon breach. 2. The parties may amend this Agreement.",
//! )?;
//!
//! for clause in report.high_risk() {
//!     println!("{}: {}", clause.clause_title, clause.risk_level);
//! }
//! ```

pub mod aggregator;
pub mod classifier;
pub mod enrichment;
pub mod extract;
pub mod schema;
pub mod segmenter;
pub mod types;

// Re-export main types at crate root
pub use aggregator::{AnalysisError, AnalysisOutcome, ContractAnalyzer, Degradation, FailurePolicy};
pub use classifier::{KeywordClassifier, RiskClassifier, HIGH_RISK_TERMS, MEDIUM_RISK_TERMS};
pub use enrichment::{DefaultEnrichment, EnrichmentError, EnrichmentKind, EnrichmentProvider};
pub use extract::{
    extract_from_bytes, extract_text, DocumentExtractor, DocumentFormat, ExtractError,
    TextExtractor,
};
pub use schema::{ReportSchema, SchemaError, Violation};
pub use segmenter::{PatternSegmenter, Segmenter, SegmenterError};
pub use types::{
    ArgumentStrength, Clause, ClauseAnalysis, ClauseCandidate, Contract, ContractReport,
    CounterPartyArgument, EditSuggestion, LegalReference, RiskLevel, RiskSummary,
};

use std::path::Path;
use thiserror::Error;

/// Errors that can occur while processing a document end to end.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Split text into clause candidates with the default segmenter.
pub fn segment(text: &str) -> Vec<ClauseCandidate> {
    PatternSegmenter::new().segment(text)
}

/// Classify clause content with the default keyword classifier.
pub fn classify(content: &str) -> RiskLevel {
    KeywordClassifier::new().classify(content)
}

/// Analyze a contract with the default classifier and enrichment.
///
/// Overwrites each clause's risk. Enrichment failures degrade to empty
/// lists; use [`ContractAnalyzer`] for other policies.
pub fn analyze_contract(contract: &mut Contract) -> Result<ContractReport, AnalysisError> {
    ContractAnalyzer::new()
        .analyze(contract)
        .map(|outcome| outcome.report)
}

/// Segment and analyze raw contract text.
pub fn analyze_text<I, S>(
    id: impl Into<String>,
    title: impl Into<String>,
    parties: I,
    text: &str,
) -> Result<ContractReport, AnalysisError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut contract = Contract::from_candidates(id, title, parties, segment(text));
    analyze_contract(&mut contract)
}

/// Extract, segment and analyze a PDF or DOCX document.
///
/// # Arguments
///
/// * `path` - Path to a `.pdf` or `.docx` file
///
/// # Returns
///
/// A `ContractReport` titled with the file's base name, or a typed error
/// when the format is unsupported or extraction fails.
pub fn process_document(path: impl AsRef<Path>) -> Result<ContractReport, ProcessError> {
    let path = path.as_ref();
    let text = extract_text(path)?;
    let mut contract = Contract::for_document(path, segment(&text));

    tracing::info!(
        path = %path.display(),
        clauses = contract.clauses.len(),
        "Processing document"
    );

    Ok(analyze_contract(&mut contract)?)
}
