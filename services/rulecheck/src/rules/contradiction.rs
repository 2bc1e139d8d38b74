//! Contradictions inside a single rule
//!
//! Two passes:
//! 1. numeric: fold each variable's conditions into an interval and flag the
//!    empty ones;
//! 2. literal: compare boolean/string equalities and `!=` pairwise, which the
//!    interval model cannot see.

use crate::rules::findings::Finding;
use crate::rules::model::*;
use crate::rules::normalize::normalize_rule;

/// Flag every (rule, variable) whose numeric conditions yield an empty interval
pub fn check_self_contradictions(rule_base: &RuleBase) -> Vec<Finding> {
    let mut findings = Vec::new();

    for rule in &rule_base.rules {
        let space = normalize_rule(rule);
        for (variable, interval) in space.empty_variables() {
            findings.push(Finding::SelfContradiction {
                rule_id: rule.id.clone(),
                variable: variable.to_string(),
                interval: *interval,
            });
        }
    }

    tracing::debug!("Found {} self-contradictions", findings.len());
    findings
}

/// Returns true if `x <a.op> a.value` and `x <b.op> b.value` exclude each other
/// on literal grounds. Mixed value types are never compared.
pub fn literals_conflict(a: &Condition, b: &Condition) -> bool {
    let same_type = matches!(
        (&a.value, &b.value),
        (Value::Number(_), Value::Number(_))
            | (Value::Boolean(_), Value::Boolean(_))
            | (Value::Text(_), Value::Text(_))
    );
    if !same_type {
        return false;
    }
    let numeric = matches!(a.value, Value::Number(_));

    match (a.operator, b.operator) {
        // numeric equalities are already covered by interval folding
        (Operator::Eq, Operator::Eq) => !numeric && a.value != b.value,
        (Operator::Eq, Operator::Ne) | (Operator::Ne, Operator::Eq) => a.value == b.value,
        _ => false,
    }
}

/// Flag pairs of literal conditions on one variable that cannot both hold
pub fn check_literal_contradictions(rule_base: &RuleBase) -> Vec<Finding> {
    let mut findings = Vec::new();

    for rule in &rule_base.rules {
        let conditions: Vec<&Condition> = rule
            .conditions
            .iter()
            .filter(|c| matches!(c.operator, Operator::Eq | Operator::Ne))
            .collect();

        for i in 0..conditions.len() {
            for j in (i + 1)..conditions.len() {
                let (first, second) = (conditions[i], conditions[j]);
                if first.variable != second.variable {
                    continue;
                }
                if literals_conflict(first, second) {
                    findings.push(Finding::LiteralContradiction {
                        rule_id: rule.id.clone(),
                        variable: first.variable.clone(),
                        first: first.clone(),
                        second: second.clone(),
                    });
                }
            }
        }
    }

    tracing::debug!("Found {} literal contradictions", findings.len());
    findings
}
