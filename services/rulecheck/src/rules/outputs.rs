//! Report rendering: human-readable text, JSON envelope and JSONL

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use crate::rules::detector::{Check, CheckReport};
use crate::rules::findings::Finding;

/// One line describing a finding
pub fn describe(finding: &Finding) -> String {
    match finding {
        Finding::SelfContradiction { rule_id, variable, interval } => format!(
            "Rule {}: conditions on '{}' cannot all hold (empty interval {})",
            rule_id, variable, interval
        ),
        Finding::LiteralContradiction { rule_id, variable, first, second } => format!(
            "Rule {}: '{}' and '{}' exclude each other on '{}'",
            rule_id, first, second, variable
        ),
        Finding::CrossRuleConflict {
            rule_id_1,
            rule_id_2,
            variable,
            value_1,
            value_2,
            shared_variables,
        } => {
            let overlap = if shared_variables.is_empty() {
                "no shared condition variables".to_string()
            } else {
                format!("overlapping on {}", shared_variables.join(", "))
            };
            format!(
                "Rules {} and {} assign different values to '{}' ({} vs {}), {}",
                rule_id_1, rule_id_2, variable, value_1, value_2, overlap
            )
        }
        Finding::RedundantRule { redundant_id, original_id, .. } => format!(
            "Rule {} is redundant: same conditions and effects as rule {}",
            redundant_id, original_id
        ),
        Finding::FormulaAlias { variables, canonical_formula } => format!(
            "Variables {} are computed by the same formula '{}'",
            variables.join(", "),
            canonical_formula
        ),
        Finding::SimilarNames { variables } => format!(
            "Variables {} may name the same quantity",
            variables.join(", ")
        ),
    }
}

/// Human-readable report, one section per checker
pub fn render_text(report: &CheckReport) -> String {
    let mut out = String::new();

    for (check, findings) in &report.results {
        out.push_str(&format!("--- {} ({}) ---\n", check.title(), findings.len()));
        if findings.is_empty() {
            out.push_str("no issues found\n");
        }
        for finding in findings {
            out.push_str(&format!("- {}\n", describe(finding)));
        }
        out.push('\n');
    }

    if report.is_clean() {
        out.push_str("Rule base is clean.\n");
    } else {
        out.push_str(&format!("{} findings in total.\n", report.total()));
    }
    out
}

/// JSON document written for a run
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<'a> {
    pub source: &'a str,
    pub generated_at: i64,
    pub total_findings: usize,
    pub results: &'a BTreeMap<Check, Vec<Finding>>,
}

impl<'a> ReportEnvelope<'a> {
    pub fn new(source: &'a str, report: &'a CheckReport) -> Self {
        Self {
            source,
            generated_at: chrono::Utc::now().timestamp_millis(),
            total_findings: report.total(),
            results: &report.results,
        }
    }
}

pub fn render_json(source: &str, report: &CheckReport) -> Result<String> {
    serde_json::to_string_pretty(&ReportEnvelope::new(source, report))
        .context("Failed to serialize report")
}

#[derive(Debug, Serialize)]
struct FindingLine<'a> {
    check: Check,
    #[serde(flatten)]
    finding: &'a Finding,
}

/// One finding per line, tagged with its checker
pub fn render_jsonl(report: &CheckReport) -> Result<String> {
    let mut out = String::new();
    for (check, finding) in report.iter() {
        let line = serde_json::to_string(&FindingLine { check, finding })
            .context("Failed to serialize finding")?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Output format of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Jsonl,
}

impl ReportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            "jsonl" => Some(Self::Jsonl),
            _ => None,
        }
    }
}

pub fn render(format: ReportFormat, source: &str, report: &CheckReport) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => render_json(source, report),
        ReportFormat::Jsonl => render_jsonl(report),
    }
}

/// Render and write a report to `path`, creating parent directories
pub fn write_report(
    path: &Path,
    format: ReportFormat,
    source: &str,
    report: &CheckReport,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let body = render(format, source, report)?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {:?}", path))?;
    file.write_all(body.as_bytes())
        .context("Failed to write report")?;

    tracing::info!("Wrote {} findings to {:?}", report.total(), path);
    Ok(())
}
