//! Variables computed by the same formula under different names

use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;
use crate::rules::findings::Finding;
use crate::rules::model::*;

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Split on `+` at parenthesis depth zero
fn top_level_terms(expr: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;

    for (idx, ch) in expr.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '+' if depth == 0 => {
                terms.push(&expr[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    terms.push(&expr[start..]);
    terms
}

/// Canonical form of a formula: whitespace removed, top-level additive terms
/// sorted lexically. `a + b` and `b+a` become `a+b`. Nothing else is
/// normalized (no products, parentheses or subtraction rewriting).
pub fn canonicalize_formula(expr: &str) -> String {
    let stripped = whitespace().replace_all(expr, "");
    let mut terms = top_level_terms(&stripped);
    if terms.len() > 1 {
        terms.sort_unstable();
    }
    terms.join("+")
}

/// Group assignment effects by canonical formula and report every formula
/// computed into more than one distinct variable.
pub fn check_formula_aliases(rule_base: &RuleBase) -> Vec<Finding> {
    // first-seen order of formulas keeps the output stable
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, BTreeSet<String>> = HashMap::new();

    for rule in &rule_base.rules {
        for effect in rule.assignments() {
            let Some(formula) = effect.value.as_formula() else {
                continue;
            };
            let canonical = canonicalize_formula(formula);
            if canonical.is_empty() {
                continue;
            }
            groups
                .entry(canonical.clone())
                .or_insert_with(|| {
                    order.push(canonical);
                    BTreeSet::new()
                })
                .insert(effect.variable.clone());
        }
    }

    let findings: Vec<Finding> = order
        .into_iter()
        .filter_map(|formula| {
            let variables = groups.remove(&formula)?;
            (variables.len() > 1).then(|| Finding::FormulaAlias {
                variables: variables.into_iter().collect(),
                canonical_formula: formula,
            })
        })
        .collect();

    tracing::debug!("Found {} formula alias groups", findings.len());
    findings
}
