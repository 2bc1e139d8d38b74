//! Conflicting assignments between rules whose conditions can hold together

use std::collections::HashMap;
use crate::rules::findings::Finding;
use crate::rules::model::*;
use crate::rules::normalize::{normalize_batch, ConditionSpace};

/// One `(rule, assignment)` pair together with the rule's condition space.
/// A rule with several assignments yields several candidates sharing a space.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub rule: &'a Rule,
    pub effect: &'a Effect,
    pub space: &'a ConditionSpace,
}

/// Build candidates in rule-base order. `spaces` must be index-aligned with
/// `rule_base.rules` (see [`normalize_batch`]).
pub fn collect_candidates<'a>(
    rule_base: &'a RuleBase,
    spaces: &'a [ConditionSpace],
) -> Vec<Candidate<'a>> {
    rule_base
        .rules
        .iter()
        .zip(spaces)
        .flat_map(|(rule, space)| {
            rule.assignments()
                .map(move |effect| Candidate { rule, effect, space })
        })
        .collect()
}

/// Returns true if the two condition spaces may be satisfied at once.
///
/// With no shared variable nothing rules it out, so the answer is yes.
/// Otherwise every shared variable must overlap; one disjoint variable is
/// enough to keep the rules apart.
pub fn conditions_can_coexist(a: &ConditionSpace, b: &ConditionSpace) -> bool {
    a.shared_variables(b).into_iter().all(|v| match (a.get(v), b.get(v)) {
        (Some(x), Some(y)) => x.overlaps(y),
        _ => true,
    })
}

/// Check a single candidate pair
pub fn check_pair(c1: &Candidate<'_>, c2: &Candidate<'_>) -> Option<Finding> {
    if c1.effect.variable != c2.effect.variable {
        return None;
    }
    if c1.effect.value == c2.effect.value {
        // same value: at worst redundant, not conflicting
        return None;
    }
    if !conditions_can_coexist(c1.space, c2.space) {
        return None;
    }

    Some(Finding::CrossRuleConflict {
        rule_id_1: c1.rule.id.clone(),
        rule_id_2: c2.rule.id.clone(),
        variable: c1.effect.variable.clone(),
        value_1: c1.effect.value.clone(),
        value_2: c2.effect.value.clone(),
        shared_variables: c1
            .space
            .shared_variables(c2.space)
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// Report every unordered candidate pair assigning different values to the
/// same variable under conditions that can hold simultaneously.
///
/// Candidates are bucketed by effect variable before the pairwise scan;
/// findings come back in the order a plain `i < j` scan would produce.
pub fn check_cross_rule_conflicts(rule_base: &RuleBase) -> Vec<Finding> {
    let spaces = normalize_batch(rule_base);
    let candidates = collect_candidates(rule_base, &spaces);

    let mut buckets: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        buckets
            .entry(candidate.effect.variable.as_str())
            .or_default()
            .push(idx);
    }

    let mut indexed: Vec<((usize, usize), Finding)> = Vec::new();
    for bucket in buckets.values() {
        for (pos, &i) in bucket.iter().enumerate() {
            for &j in &bucket[pos + 1..] {
                if let Some(finding) = check_pair(&candidates[i], &candidates[j]) {
                    indexed.push(((i, j), finding));
                }
            }
        }
    }
    indexed.sort_by_key(|(key, _)| *key);

    tracing::debug!(
        "Compared {} candidates across {} effect variables, {} conflicts",
        candidates.len(),
        buckets.len(),
        indexed.len()
    );

    indexed.into_iter().map(|(_, finding)| finding).collect()
}
