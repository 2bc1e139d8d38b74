//! Runs the checkers over one rule base snapshot and aggregates findings
//!
//! Checkers are pure and independent: the sequential and concurrent entry
//! points produce identical reports.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use crate::rules::conflicts::check_cross_rule_conflicts;
use crate::rules::contradiction::{check_literal_contradictions, check_self_contradictions};
use crate::rules::findings::Finding;
use crate::rules::formula::check_formula_aliases;
use crate::rules::model::RuleBase;
use crate::rules::naming::{check_similar_names, NamingConfig};
use crate::rules::redundancy::check_redundant_rules;

/// Checker identity, also the key of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    SelfContradictions,
    LiteralContradictions,
    CrossRuleConflicts,
    RedundantRules,
    FormulaAliases,
    SimilarNames,
}

impl Check {
    pub const ALL: [Check; 6] = [
        Check::SelfContradictions,
        Check::LiteralContradictions,
        Check::CrossRuleConflicts,
        Check::RedundantRules,
        Check::FormulaAliases,
        Check::SimilarNames,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Check::SelfContradictions => "self_contradictions",
            Check::LiteralContradictions => "literal_contradictions",
            Check::CrossRuleConflicts => "cross_rule_conflicts",
            Check::RedundantRules => "redundant_rules",
            Check::FormulaAliases => "formula_aliases",
            Check::SimilarNames => "similar_names",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().replace('-', "_");
        Check::ALL.into_iter().find(|c| c.name() == wanted)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Check::SelfContradictions => "Self-contradictory rules",
            Check::LiteralContradictions => "Contradictory literal conditions",
            Check::CrossRuleConflicts => "Conflicting rules",
            Check::RedundantRules => "Redundant rules",
            Check::FormulaAliases => "Formula aliases",
            Check::SimilarNames => "Similar variable names",
        }
    }

    /// Run this checker alone
    pub fn run(&self, rule_base: &RuleBase, naming: &NamingConfig) -> Vec<Finding> {
        match self {
            Check::SelfContradictions => check_self_contradictions(rule_base),
            Check::LiteralContradictions => check_literal_contradictions(rule_base),
            Check::CrossRuleConflicts => check_cross_rule_conflicts(rule_base),
            Check::RedundantRules => check_redundant_rules(rule_base),
            Check::FormulaAliases => check_formula_aliases(rule_base),
            Check::SimilarNames => check_similar_names(rule_base, naming),
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for a detection run
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub checks: Vec<Check>,
    pub naming: NamingConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            checks: Check::ALL
                .into_iter()
                .filter(|c| *c != Check::SimilarNames)
                .collect(),
            naming: NamingConfig::default(),
        }
    }
}

impl DetectorConfig {
    pub fn all() -> Self {
        Self {
            checks: Check::ALL.to_vec(),
            naming: NamingConfig::default(),
        }
    }

    pub fn only(checks: &[Check]) -> Self {
        Self {
            checks: checks.to_vec(),
            ..Self::default()
        }
    }
}

/// Findings per checker. Every enabled checker has an entry; an empty list
/// means no issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport {
    pub results: BTreeMap<Check, Vec<Finding>>,
}

impl CheckReport {
    pub fn findings(&self, check: Check) -> &[Finding] {
        self.results.get(&check).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Check, &Finding)> {
        self.results
            .iter()
            .flat_map(|(check, findings)| findings.iter().map(move |f| (*check, f)))
    }
}

/// Run enabled checkers one after another
pub fn run_checks(rule_base: &RuleBase, config: &DetectorConfig) -> CheckReport {
    let mut report = CheckReport::default();

    for check in &config.checks {
        let findings = check.run(rule_base, &config.naming);
        tracing::debug!("{}: {} findings", check, findings.len());
        report.results.insert(*check, findings);
    }

    tracing::info!(
        "Checked {} rules with {} checkers: {} findings",
        rule_base.len(),
        report.results.len(),
        report.total()
    );
    report
}

/// Run enabled checkers concurrently on the blocking pool and join them
pub async fn run_checks_concurrent(
    rule_base: Arc<RuleBase>,
    config: &DetectorConfig,
) -> Result<CheckReport> {
    let tasks: Vec<_> = config
        .checks
        .iter()
        .copied()
        .map(|check| {
            let rule_base = Arc::clone(&rule_base);
            let naming = config.naming.clone();
            tokio::task::spawn_blocking(move || (check, check.run(&rule_base, &naming)))
        })
        .collect();

    let results = futures::future::try_join_all(tasks)
        .await
        .context("Checker task failed")?;

    let report = CheckReport {
        results: results.into_iter().collect(),
    };

    tracing::info!(
        "Checked {} rules with {} concurrent checkers: {} findings",
        rule_base.len(),
        report.results.len(),
        report.total()
    );
    Ok(report)
}
