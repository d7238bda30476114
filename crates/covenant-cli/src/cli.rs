use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use covenant_core::ContractReport;
use covenant_runtime::{AnalysisOrchestrator, RuntimeConfig};

#[derive(Debug, Parser)]
#[command(
    name = "covenant",
    about = "Analyze contract documents for clause-level risk",
    version
)]
pub struct Cli {
    /// Path to the contract document (PDF or DOCX)
    pub file_path: PathBuf,

    /// Output file path for analysis results (JSON)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Runtime config (YAML); enables concurrent enrichment with timeouts
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,
}

/// Analyze the document and write the report or a status line to `out`.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let report = analyze(cli)?;
    write_report(&report, cli.output.as_deref(), out)
}

/// The line printed when a run fails, including every error cause.
pub fn error_line(err: &anyhow::Error) -> String {
    format!("Error processing document: {:#}", err)
}

/// Nothing is written unless the report passes the schema check.
fn write_report(
    report: &ContractReport,
    output: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    report.validate()?;
    let json = report.to_json_pretty()?;

    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            writeln!(out, "Analysis results saved to {}", path.display())?;
        }
        None => writeln!(out, "{}", json)?,
    }

    Ok(())
}

fn analyze(cli: &Cli) -> Result<ContractReport> {
    let Some(config_path) = &cli.config else {
        return Ok(covenant_core::process_document(&cli.file_path)?);
    };

    let config = RuntimeConfig::from_yaml_file(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?
        .with_env_overrides()?;
    let orchestrator = AnalysisOrchestrator::new(config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(orchestrator.process_document(&cli.file_path))?;

    for degraded in &result.degradations {
        tracing::warn!(
            clause_id = %degraded.clause_id,
            kind = %degraded.kind,
            reason = %degraded.reason,
            "Clause enrichment degraded"
        );
    }

    Ok(result.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::{ClauseAnalysis, RiskLevel};
    use tempfile::tempdir;

    const LEASE_PDF: &[u8] = b"%PDF-1.4\n4 0 obj\n<< /Length 0 >>\nstream\n\
        BT /F1 11 Tf 72 720 Td (1. Tenant shall pay a penalty for late rent.) Tj \
        0 -14 Td (2. Landlord may extend the term.) Tj ET\nendstream\nendobj\n%%EOF\n";

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("covenant").chain(args.iter().copied())).unwrap()
    }

    fn write_lease(dir: &Path) -> PathBuf {
        let path = dir.join("lease.pdf");
        fs::write(&path, LEASE_PDF).unwrap();
        path
    }

    fn run_to_string(cli: &Cli) -> Result<String> {
        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_defaults() {
        let cli = cli(&["contract.pdf"]);
        assert_eq!(cli.file_path, PathBuf::from("contract.pdf"));
        assert!(cli.output.is_none());
        assert!(cli.config.is_none());
        assert_eq!(cli.log_level, "warn");
        assert!(!cli.log_json);
    }

    #[test]
    fn test_file_path_required() {
        assert!(Cli::try_parse_from(["covenant"]).is_err());
    }

    #[test]
    fn test_prints_report_json() {
        let dir = tempdir().unwrap();
        let path = write_lease(dir.path());

        let stdout = run_to_string(&cli(&[path.to_str().unwrap()])).unwrap();
        let report = ContractReport::from_json(&stdout).unwrap();

        assert_eq!(report.contract_title, "lease.pdf");
        assert_eq!(report.analysis.len(), 2);
    }

    #[test]
    fn test_output_file_and_status_line() {
        let dir = tempdir().unwrap();
        let path = write_lease(dir.path());
        let output = dir.path().join("report.json");

        let stdout = run_to_string(&cli(&[
            path.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]))
        .unwrap();

        assert_eq!(
            stdout.trim_end(),
            format!("Analysis results saved to {}", output.display())
        );
        let saved = fs::read_to_string(&output).unwrap();
        assert!(ContractReport::from_json(&saved).is_ok());
    }

    #[test]
    fn test_config_runs_orchestrator() {
        let dir = tempdir().unwrap();
        let path = write_lease(dir.path());
        let config = dir.path().join("covenant.yaml");
        fs::write(&config, "max_concurrency: 2\nenrichment_timeout: \"5s\"\n").unwrap();

        let stdout = run_to_string(&cli(&[
            path.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]))
        .unwrap();
        let report = ContractReport::from_json(&stdout).unwrap();

        assert_eq!(report.analysis.len(), 2);
        assert_eq!(report.analysis[0].edit_suggestions.len(), 1);
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = run_to_string(&cli(&["notes.txt"])).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file format: .txt");
    }

    #[test]
    fn test_missing_config_is_error() {
        let dir = tempdir().unwrap();
        let path = write_lease(dir.path());
        let missing = dir.path().join("absent.yaml");

        let err = run_to_string(&cli(&[
            path.to_str().unwrap(),
            "--config",
            missing.to_str().unwrap(),
        ]))
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to load config"));
    }

    #[test]
    fn test_error_line_shows_cause_chain() {
        let dir = tempdir().unwrap();
        let path = write_lease(dir.path());
        let config = dir.path().join("covenant.yaml");
        fs::write(&config, "max_concurrency: [1, 2]\n").unwrap();

        let err = run_to_string(&cli(&[
            path.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]))
        .unwrap_err();

        let line = error_line(&err);
        let outer = format!("Error processing document: {}", err);
        assert!(line.starts_with(&outer));
        assert!(line.len() > outer.len());
        assert!(line.contains("Failed to parse YAML"));
    }

    #[test]
    fn test_invalid_report_is_not_written() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("report.json");
        let report = ContractReport {
            contract_id: "contract_1".into(),
            contract_title: "lease.pdf".into(),
            analysis: vec![ClauseAnalysis {
                clause_id: String::new(),
                clause_title: "Clause 1".into(),
                risk_level: RiskLevel::Low,
                edit_suggestions: vec![],
                counterparty_arguments: vec![],
                legal_references: vec![],
            }],
        };

        let mut stdout = Vec::new();
        let err = write_report(&report, Some(&output), &mut stdout).unwrap_err();

        assert!(stdout.is_empty());
        assert!(!output.exists());
        assert!(error_line(&err).starts_with(
            "Error processing document: Report does not match schema: /analysis/0/clause_id: "
        ));
    }
}
