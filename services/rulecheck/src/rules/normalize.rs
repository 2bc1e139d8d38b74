//! Normalize a rule's condition list into one interval per variable

use serde::Serialize;
use crate::rules::interval::Interval;
use crate::rules::model::*;

/// Per-variable intervals of one rule, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConditionSpace {
    entries: Vec<(String, Interval)>,
}

impl ConditionSpace {
    pub fn get(&self, variable: &str) -> Option<&Interval> {
        self.entries
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, iv)| iv)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Interval)> {
        self.entries.iter().map(|(name, iv)| (name.as_str(), iv))
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Variables constrained in both spaces, in this space's order
    pub fn shared_variables<'a>(&'a self, other: &ConditionSpace) -> Vec<&'a str> {
        self.variables()
            .filter(|v| other.get(v).is_some())
            .collect()
    }

    /// Variables whose conditions cannot all hold
    pub fn empty_variables(&self) -> impl Iterator<Item = (&str, &Interval)> {
        self.iter().filter(|(_, iv)| iv.is_empty())
    }

    fn fold(&mut self, variable: &str, operator: Operator, value: f64) {
        match self.entries.iter_mut().find(|(name, _)| name == variable) {
            Some((_, iv)) => *iv = iv.fold(operator, value),
            None => self
                .entries
                .push((variable.to_string(), Interval::unbounded().fold(operator, value))),
        }
    }
}

/// Fold every numeric condition into its variable's interval, in input order.
///
/// Non-numeric values, non-finite numbers and `!=` contribute nothing: a
/// variable only constrained that way does not appear in the result.
pub fn normalize_conditions(conditions: &[Condition]) -> ConditionSpace {
    let mut space = ConditionSpace::default();

    for condition in conditions {
        if !condition.operator.is_interval() {
            continue;
        }
        let value = match condition.value.as_number() {
            Some(v) if v.is_finite() => v,
            Some(v) => {
                tracing::debug!(
                    "Skipping non-finite bound {} on '{}'",
                    v,
                    condition.variable
                );
                continue;
            }
            None => continue,
        };
        space.fold(&condition.variable, condition.operator, value);
    }

    space
}

/// Normalize a single rule
pub fn normalize_rule(rule: &Rule) -> ConditionSpace {
    normalize_conditions(&rule.conditions)
}

/// Batch normalize every rule, index-aligned with `rule_base.rules`
pub fn normalize_batch(rule_base: &RuleBase) -> Vec<ConditionSpace> {
    rule_base.rules.iter().map(normalize_rule).collect()
}
