//! Risk classification.
//!
//! Assigns exactly one [`RiskLevel`] to a clause's text. The default
//! [`KeywordClassifier`] checks two term lists in strict precedence:
//!
//! | Tier | Condition |
//! |------|-----------|
//! | **HIGH** | any HIGH term occurs (case-insensitive substring) |
//! | **MEDIUM** | no HIGH term, any MEDIUM term occurs |
//! | **LOW** | neither list matches |
//!
//! Classification is total: every input, including the empty string, yields a
//! tier. Learned or rule-engine classifiers plug in through [`RiskClassifier`].

use crate::types::RiskLevel;

/// Terms signalling termination, liability, indemnity, penalty or breach.
pub const HIGH_RISK_TERMS: &[&str] = &["terminate", "liability", "indemnity", "penalty", "breach"];

/// Terms signalling change, amendment or renewal provisions.
pub const MEDIUM_RISK_TERMS: &[&str] = &["change", "modify", "amend", "extend", "renew"];

/// Strategy mapping clause text to a risk tier.
pub trait RiskClassifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Classify clause content. Must never fail.
    fn classify(&self, content: &str) -> RiskLevel;
}

/// Keyword-list classifier.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    high: Vec<String>,
    medium: Vec<String>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::with_terms(HIGH_RISK_TERMS, MEDIUM_RISK_TERMS)
    }

    /// Build from custom term lists. Terms are matched case-insensitively;
    /// empty terms are ignored.
    pub fn with_terms<H, M>(high: H, medium: M) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        Self {
            high: normalize(high),
            medium: normalize(medium),
        }
    }

    pub fn high_terms(&self) -> &[String] {
        &self.high
    }

    pub fn medium_terms(&self) -> &[String] {
        &self.medium
    }

    /// Classify and report the term that decided the tier.
    ///
    /// Returns `None` for the term when the result is LOW.
    pub fn matched_term(&self, content: &str) -> (RiskLevel, Option<&str>) {
        let lower = content.to_lowercase();

        if let Some(term) = self.high.iter().find(|t| lower.contains(t.as_str())) {
            return (RiskLevel::High, Some(term.as_str()));
        }

        if let Some(term) = self.medium.iter().find(|t| lower.contains(t.as_str())) {
            return (RiskLevel::Medium, Some(term.as_str()));
        }

        (RiskLevel::Low, None)
    }
}

fn normalize<I>(terms: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    terms
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    fn classify(&self, content: &str) -> RiskLevel {
        let (risk, term) = self.matched_term(content);
        tracing::trace!(risk = %risk, term = ?term, "Classified clause");
        risk
    }
}
