//! Core types for Covenant analysis.
//!
//! The report types (`ContractReport`, `ClauseAnalysis` and the three
//! enrichment records) serialize to the exact JSON shape consumed downstream,
//! so field names here are part of the public contract.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default parties recorded when the document does not name them.
pub const DEFAULT_PARTIES: [&str; 2] = ["Your Company", "Counterparty"];

/// Category tag assigned to every segmented clause.
pub const GENERAL_CLAUSE_TYPE: &str = "general";

/// Coarse legal exposure associated with a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    /// Assigned at segmentation time, before classification.
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn is_low(&self) -> bool {
        matches!(self, RiskLevel::Low)
    }

    pub fn is_high(&self) -> bool {
        matches!(self, RiskLevel::High)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level: {}", other)),
        }
    }
}

/// How forcefully the counterparty is expected to press an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentStrength {
    Weak,
    Moderate,
    Strong,
}

/// A clause candidate produced by segmentation.
///
/// `start`/`end` are byte offsets into the source text and
/// `content == &text[start..end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseCandidate {
    pub id: String,
    pub title: String,
    pub content: String,
    pub start: usize,
    pub end: usize,
}

/// A contiguous unit of contract text subject to risk assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clause {
    /// Positional identifier (`clause_1`, `clause_2`, ...)
    pub id: String,

    /// Display label
    pub title: String,

    /// Text copied verbatim from the source
    pub content: String,

    /// Free-form category tag
    #[serde(rename = "type")]
    pub clause_type: String,

    /// Overwritten by the risk classifier during analysis
    pub risk: RiskLevel,
}

impl Clause {
    /// Build an unclassified clause from a segmentation candidate.
    pub fn from_candidate(candidate: ClauseCandidate) -> Self {
        Self {
            id: candidate.id,
            title: candidate.title,
            content: candidate.content,
            clause_type: GENERAL_CLAUSE_TYPE.to_string(),
            risk: RiskLevel::default(),
        }
    }
}

/// A contract document and the clauses it owns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    pub id: String,
    pub title: String,
    /// Unique, in the order first listed
    pub parties: Vec<String>,
    /// Document order
    pub clauses: Vec<Clause>,
}

impl Contract {
    /// Create a contract with no clauses. Duplicate party names are dropped.
    pub fn new<I, S>(id: impl Into<String>, title: impl Into<String>, parties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let parties = parties
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| seen.insert(p.clone()))
            .collect();

        Self {
            id: id.into(),
            title: title.into(),
            parties,
            clauses: Vec::new(),
        }
    }

    /// Create a contract populated from segmentation output.
    pub fn from_candidates<I, S>(
        id: impl Into<String>,
        title: impl Into<String>,
        parties: I,
        candidates: Vec<ClauseCandidate>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut contract = Self::new(id, title, parties);
        contract.clauses = candidates.into_iter().map(Clause::from_candidate).collect();
        contract
    }

    /// Create the contract for a source document.
    ///
    /// The title is the file's base name; parties are not extracted from the
    /// text and default to [`DEFAULT_PARTIES`].
    pub fn for_document(path: &Path, candidates: Vec<ClauseCandidate>) -> Self {
        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_candidates("contract_1", title, DEFAULT_PARTIES, candidates)
    }

    pub fn clause(&self, id: &str) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.id == id)
    }
}

/// A proposed rewrite of a clause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditSuggestion {
    pub id: String,
    pub clause_id: String,
    pub original: String,
    pub suggested: String,
    pub reasoning: String,
    pub impact: String,
}

/// A simulated objection the other party might raise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CounterPartyArgument {
    pub id: String,
    pub clause_id: String,
    pub argument: String,
    pub strength: ArgumentStrength,
}

/// A citation supporting analysis of a clause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalReference {
    pub id: String,
    pub clause_id: String,
    pub source: String,
    pub citation: String,
    pub relevance: String,
    /// Serialized as `null` when absent
    #[serde(default)]
    pub url: Option<String>,
}

/// Analysis of a single clause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClauseAnalysis {
    pub clause_id: String,
    pub clause_title: String,
    pub risk_level: RiskLevel,
    pub edit_suggestions: Vec<EditSuggestion>,
    pub counterparty_arguments: Vec<CounterPartyArgument>,
    pub legal_references: Vec<LegalReference>,
}

impl ClauseAnalysis {
    /// Start an analysis record with empty annotation lists.
    pub fn for_clause(clause: &Clause) -> Self {
        Self {
            clause_id: clause.id.clone(),
            clause_title: clause.title.clone(),
            risk_level: clause.risk,
            edit_suggestions: Vec::new(),
            counterparty_arguments: Vec::new(),
            legal_references: Vec::new(),
        }
    }
}

/// Clause counts per risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// The terminal artifact of an analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractReport {
    pub contract_id: String,
    pub contract_title: String,
    /// Document order
    pub analysis: Vec<ClauseAnalysis>,
}

impl ContractReport {
    pub fn new(contract: &Contract) -> Self {
        Self {
            contract_id: contract.id.clone(),
            contract_title: contract.title.clone(),
            analysis: Vec::with_capacity(contract.clauses.len()),
        }
    }

    /// Clauses analyzed at the given tier, in document order.
    pub fn clauses_at(&self, risk: RiskLevel) -> impl Iterator<Item = &ClauseAnalysis> {
        self.analysis.iter().filter(move |a| a.risk_level == risk)
    }

    pub fn high_risk(&self) -> impl Iterator<Item = &ClauseAnalysis> {
        self.clauses_at(RiskLevel::High)
    }

    pub fn risk_summary(&self) -> RiskSummary {
        self.analysis
            .iter()
            .fold(RiskSummary::default(), |mut summary, a| {
                match a.risk_level {
                    RiskLevel::Low => summary.low += 1,
                    RiskLevel::Medium => summary.medium += 1,
                    RiskLevel::High => summary.high += 1,
                }
                summary
            })
    }

    /// Serialize with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
