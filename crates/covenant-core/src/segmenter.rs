//! Clause segmentation.
//!
//! Splits plain contract text into an ordered sequence of clause candidates.
//!
//! The default [`PatternSegmenter`] recognizes `"<digits>. <Capitalized text>."`
//! runs with a single regex. It under-segments clauses that lack that shape and
//! over-segments on abbreviations such as "U.S."; structural parsing (heading
//! hierarchies, list detection, layout) can replace it behind the
//! [`Segmenter`] trait without touching callers.
//!
//! Identifiers are positional (`clause_1`, `clause_2`, ...). Re-segmenting
//! edited text may renumber semantically unchanged clauses, so callers that
//! need identity across edits must compare content, not ids.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::types::ClauseCandidate;

/// Numbered clause pattern: a number, optional period, optional whitespace,
/// a letter, then everything up to and including the next period.
pub const CLAUSE_PATTERN: &str = r"(?i)\d+\.?\s*[A-Z][^.]+\.";

lazy_static! {
    static ref NUMBERED_CLAUSE: Regex = Regex::new(CLAUSE_PATTERN).unwrap();
}

/// Errors from building a segmenter.
#[derive(Error, Debug)]
pub enum SegmenterError {
    #[error("Invalid clause pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Strategy that turns document text into clause candidates.
///
/// Implementations must return candidates in increasing start-offset order,
/// with non-overlapping spans and content copied verbatim from the input.
pub trait Segmenter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn segment(&self, text: &str) -> Vec<ClauseCandidate>;
}

/// Regex-driven segmenter.
#[derive(Debug, Clone)]
pub struct PatternSegmenter {
    pattern: Regex,
}

impl PatternSegmenter {
    pub fn new() -> Self {
        Self {
            pattern: NUMBERED_CLAUSE.clone(),
        }
    }

    /// Use a caller-supplied pattern in place of [`CLAUSE_PATTERN`].
    pub fn with_pattern(pattern: &str) -> Result<Self, SegmenterError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Default for PatternSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for PatternSegmenter {
    fn name(&self) -> &str {
        "pattern"
    }

    fn segment(&self, text: &str) -> Vec<ClauseCandidate> {
        // find_iter is leftmost-first and resumes after each match
        let candidates: Vec<ClauseCandidate> = self
            .pattern
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .enumerate()
            .map(|(i, m)| ClauseCandidate {
                id: format!("clause_{}", i + 1),
                title: format!("Clause {}", i + 1),
                content: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            })
            .collect();

        tracing::debug!(
            segmenter = self.name(),
            text_len = text.len(),
            clauses = candidates.len(),
            "Segmented document text"
        );

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TWO_CLAUSES: &str = "1. The Supplier may terminate this Agreement upon breach. \
                               2. The parties may amend this Agreement by written consent.";

    #[test]
    fn test_two_numbered_clauses() {
        let clauses = PatternSegmenter::new().segment(TWO_CLAUSES);

        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].id, "clause_1");
        assert_eq!(clauses[0].title, "Clause 1");
        assert_eq!(
            clauses[0].content,
            "1. The Supplier may terminate this Agreement upon breach."
        );
        assert_eq!(clauses[1].id, "clause_2");
        assert_eq!(
            clauses[1].content,
            "2. The parties may amend this Agreement by written consent."
        );
    }

    #[test]
    fn test_content_matches_span() {
        let text = "Preamble text\n3. Fees are payable monthly.\n4. Notices go by email.";
        for c in PatternSegmenter::new().segment(text) {
            assert_eq!(&text[c.start..c.end], c.content);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(PatternSegmenter::new().segment("").is_empty());
    }

    #[test]
    fn test_no_numbered_clauses() {
        let text = "This agreement has no numbered sections at all.";
        assert!(PatternSegmenter::new().segment(text).is_empty());
    }

    #[test]
    fn test_marker_without_period() {
        let clauses = PatternSegmenter::new().segment("12 Governing law is Delaware.");
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].content, "12 Governing law is Delaware.");
    }

    #[test]
    fn test_abbreviation_splits_clause() {
        // Known over-segmentation: the first period ends the clause.
        let clauses = PatternSegmenter::new().segment("1. Governed by U.S. law.");
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].content, "1. Governed by U.");
    }

    #[test]
    fn test_numbering_is_positional() {
        let text = "7. Seventh section text. 9. Ninth section text.";
        let clauses = PatternSegmenter::new().segment(text);
        assert_eq!(clauses[0].id, "clause_1");
        assert_eq!(clauses[1].id, "clause_2");
    }

    #[test]
    fn test_custom_pattern() {
        let segmenter = PatternSegmenter::with_pattern(r"Section \d+[^.]*\.").unwrap();
        let clauses = segmenter.segment("Section 1 applies. Section 2 also applies.");
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[1].content, "Section 2 also applies.");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(matches!(
            PatternSegmenter::with_pattern("(unclosed"),
            Err(SegmenterError::InvalidPattern(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_segmentation_is_deterministic(text in "[0-9A-Za-z .,\n]{0,200}") {
            let segmenter = PatternSegmenter::new();
            prop_assert_eq!(segmenter.segment(&text), segmenter.segment(&text));
        }

        #[test]
        fn prop_spans_ordered_and_disjoint(text in "[0-9A-Za-z .;\n]{0,300}") {
            let clauses = PatternSegmenter::new().segment(&text);
            for pair in clauses.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
            for (i, c) in clauses.iter().enumerate() {
                prop_assert_eq!(&text[c.start..c.end], c.content.as_str());
                prop_assert_eq!(c.id.clone(), format!("clause_{}", i + 1));
            }
        }
    }
}
