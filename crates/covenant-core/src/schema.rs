//! Shape checks for analysis reports.
//!
//! `schema/report.schema.json` pins the field names, enum spellings and
//! nesting of the JSON report. [`ContractReport::validate`] checks a report
//! against the bundled copy before it is written anywhere.

use std::fmt;

use lazy_static::lazy_static;
use serde_json::Value;
use thiserror::Error;

use crate::types::ContractReport;

const BUNDLED_SCHEMA: &str = include_str!("../../../schema/report.schema.json");

lazy_static! {
    static ref BUNDLED: Result<ReportSchema, String> = ReportSchema::from_json(BUNDLED_SCHEMA)
        .map_err(|e| e.to_string());
}

/// One place where a report departs from the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer into the report, `/` for the root
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors from checking a report's shape.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Report schema is unusable: {0}")]
    Unusable(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Report does not match schema: {}", join(.0))]
    Violations(Vec<Violation>),
}

impl SchemaError {
    /// Violations found, empty for the other variants.
    pub fn violations(&self) -> &[Violation] {
        match self {
            SchemaError::Violations(found) => found,
            _ => &[],
        }
    }
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A compiled report schema.
pub struct ReportSchema {
    validator: jsonschema::Validator,
}

impl ReportSchema {
    /// The schema shipped with this crate, compiled on first use.
    pub fn bundled() -> Result<&'static ReportSchema, SchemaError> {
        BUNDLED.as_ref().map_err(|e| SchemaError::Unusable(e.clone()))
    }

    pub fn from_json(schema: &str) -> Result<Self, SchemaError> {
        let schema: Value = serde_json::from_str(schema)?;
        let validator =
            jsonschema::validator_for(&schema).map_err(|e| SchemaError::Unusable(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Check a report that is already in JSON form.
    pub fn check_value(&self, report: &Value) -> Result<(), SchemaError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(report)
            .map(|e| Violation {
                path: match e.instance_path.as_str() {
                    "" => "/".to_string(),
                    path => path.to_string(),
                },
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Violations(violations))
        }
    }

    pub fn check(&self, report: &ContractReport) -> Result<(), SchemaError> {
        self.check_value(&serde_json::to_value(report)?)
    }
}

impl ContractReport {
    /// Check this report against the bundled schema.
    pub fn validate(&self) -> Result<(), SchemaError> {
        ReportSchema::bundled()?.check(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClauseAnalysis, RiskLevel};
    use serde_json::json;

    fn valid_report() -> Value {
        json!({
            "contract_id": "contract_1",
            "contract_title": "msa.pdf",
            "analysis": [{
                "clause_id": "clause_1",
                "clause_title": "Clause 1",
                "risk_level": "high",
                "edit_suggestions": [{
                    "id": "suggestion_clause_1_1",
                    "clause_id": "clause_1",
                    "original": "1. We may terminate.",
                    "suggested": "Consider revising: 1. We may terminate.",
                    "reasoning": "High risk clause that may expose to liability",
                    "impact": "Reduces legal exposure"
                }],
                "counterparty_arguments": [{
                    "id": "argument_clause_1_1",
                    "clause_id": "clause_1",
                    "argument": "This clause is industry standard and shouldn't be modified.",
                    "strength": "strong"
                }],
                "legal_references": [{
                    "id": "reference_clause_1_1",
                    "clause_id": "clause_1",
                    "source": "General Contract Law",
                    "citation": "Section 2-207 of the UCC",
                    "relevance": "Provides context for contract formation and modification",
                    "url": null
                }]
            }]
        })
    }

    fn schema() -> &'static ReportSchema {
        ReportSchema::bundled().unwrap()
    }

    #[test]
    fn test_valid_report_passes() {
        assert!(schema().check_value(&valid_report()).is_ok());
    }

    #[test]
    fn test_typed_report_validates() {
        let report = ContractReport {
            contract_id: "contract_1".into(),
            contract_title: "msa.docx".into(),
            analysis: vec![ClauseAnalysis {
                clause_id: "clause_1".into(),
                clause_title: "Clause 1".into(),
                risk_level: RiskLevel::Medium,
                edit_suggestions: vec![],
                counterparty_arguments: vec![],
                legal_references: vec![],
            }],
        };
        assert!(report.validate().is_ok());
    }

    #[test]
    fn test_unknown_risk_level_points_at_field() {
        let mut value = valid_report();
        value["analysis"][0]["risk_level"] = json!("critical");

        let err = schema().check_value(&value).unwrap_err();
        let paths: Vec<&str> = err.violations().iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, ["/analysis/0/risk_level"]);
        assert!(err
            .to_string()
            .starts_with("Report does not match schema: /analysis/0/risk_level: "));
    }

    #[test]
    fn test_missing_url_key_fails() {
        let mut value = valid_report();
        value["analysis"][0]["legal_references"][0]
            .as_object_mut()
            .unwrap()
            .remove("url");

        let err = schema().check_value(&value).unwrap_err();
        assert_eq!(err.violations()[0].path, "/analysis/0/legal_references/0");
    }

    #[test]
    fn test_extra_top_level_field_reported_at_root() {
        let mut value = valid_report();
        value["generated_at"] = json!("2025-01-01");

        let err = schema().check_value(&value).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].path, "/");
    }

    #[test]
    fn test_every_violation_listed() {
        let mut value = valid_report();
        value["analysis"][0]["counterparty_arguments"][0]["strength"] = json!("overwhelming");
        value["contract_id"] = json!(7);

        let err = schema().check_value(&value).unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_custom_schema_and_bad_schema() {
        let strict = ReportSchema::from_json(r#"{"type": "object", "required": ["signed_by"]}"#)
            .unwrap();
        assert!(strict.check_value(&valid_report()).is_err());

        let broken = ReportSchema::from_json(r#"{"type": "nonsense"}"#);
        assert!(matches!(broken, Err(SchemaError::Unusable(_))));

        let not_json = ReportSchema::from_json("{");
        assert!(matches!(not_json, Err(SchemaError::Json(_))));
    }
}
