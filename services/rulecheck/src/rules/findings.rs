//! Structured findings produced by the checkers

use serde::Serialize;
use crate::rules::interval::Interval;
use crate::rules::model::{Condition, EffectValue};

/// A detected defect in the rule base
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Finding {
    /// Conditions on one variable inside one rule that cannot all hold
    SelfContradiction {
        rule_id: String,
        variable: String,
        interval: Interval,
    },
    /// Two literal conditions on one variable that exclude each other
    LiteralContradiction {
        rule_id: String,
        variable: String,
        first: Condition,
        second: Condition,
    },
    /// Two rules that may fire together but assign different values
    CrossRuleConflict {
        rule_id_1: String,
        rule_id_2: String,
        variable: String,
        value_1: EffectValue,
        value_2: EffectValue,
        shared_variables: Vec<String>,
    },
    /// A rule whose conditions and effects repeat an earlier rule
    RedundantRule {
        redundant_id: String,
        original_id: String,
        signature: String,
    },
    /// Distinct variables computed by the same formula
    FormulaAlias {
        variables: Vec<String>,
        canonical_formula: String,
    },
    /// Variable names that look like spellings of one concept
    SimilarNames { variables: Vec<String> },
}

impl Finding {
    pub fn kind(&self) -> &'static str {
        match self {
            Finding::SelfContradiction { .. } => "self-contradiction",
            Finding::LiteralContradiction { .. } => "literal-contradiction",
            Finding::CrossRuleConflict { .. } => "cross-rule-conflict",
            Finding::RedundantRule { .. } => "redundant-rule",
            Finding::FormulaAlias { .. } => "formula-alias",
            Finding::SimilarNames { .. } => "similar-names",
        }
    }

    /// Rule ids this finding points at
    pub fn rule_ids(&self) -> Vec<&str> {
        match self {
            Finding::SelfContradiction { rule_id, .. }
            | Finding::LiteralContradiction { rule_id, .. } => vec![rule_id.as_str()],
            Finding::CrossRuleConflict { rule_id_1, rule_id_2, .. } => {
                vec![rule_id_1.as_str(), rule_id_2.as_str()]
            }
            Finding::RedundantRule { redundant_id, original_id, .. } => {
                vec![redundant_id.as_str(), original_id.as_str()]
            }
            Finding::FormulaAlias { .. } | Finding::SimilarNames { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_serializes_with_kind_tag() {
        let finding = Finding::RedundantRule {
            redundant_id: "R2".to_string(),
            original_id: "R1".to_string(),
            signature: "abc".to_string(),
        };

        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["kind"], "redundant-rule");
        assert_eq!(json["original_id"], "R1");
        assert_eq!(finding.kind(), "redundant-rule");
        assert_eq!(finding.rule_ids(), vec!["R2", "R1"]);
    }

    #[test]
    fn test_effect_values_serialize_untagged() {
        let finding = Finding::CrossRuleConflict {
            rule_id_1: "R1".to_string(),
            rule_id_2: "R2".to_string(),
            variable: "discount".to_string(),
            value_1: EffectValue::Number(10.0),
            value_2: EffectValue::Formula("base*2".to_string()),
            shared_variables: vec!["price".to_string()],
        };

        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["kind"], "cross-rule-conflict");
        assert_eq!(json["value_1"], 10.0);
        assert_eq!(json["value_2"], "base*2");
    }
}
