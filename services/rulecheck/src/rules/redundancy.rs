//! Redundant rule detection via order-independent signatures

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use crate::rules::findings::Finding;
use crate::rules::model::*;

/// Canonical `(variable, operator, value)` rendering
pub type Triple = (String, String, String);

/// Order-independent encoding of a rule's conditions and effects.
/// Ids, descriptions and declaration order do not participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleSignature {
    pub conditions: Vec<Triple>,
    pub effects: Vec<Triple>,
}

impl RuleSignature {
    pub fn of(rule: &Rule) -> Self {
        let mut conditions: Vec<Triple> = rule
            .conditions
            .iter()
            .map(|c| {
                (
                    c.variable.clone(),
                    c.operator.symbol().to_string(),
                    c.value.to_string(),
                )
            })
            .collect();
        let mut effects: Vec<Triple> = rule
            .effects
            .iter()
            .map(|e| {
                (
                    e.variable.clone(),
                    e.operator.symbol().to_string(),
                    e.value.to_string(),
                )
            })
            .collect();

        conditions.sort();
        effects.sort();

        Self { conditions, effects }
    }

    /// Short stable digest, for reports
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (section, triples) in [("causes", &self.conditions), ("effects", &self.effects)] {
            hasher.update(section.as_bytes());
            for (variable, operator, value) in triples {
                hasher.update(variable.as_bytes());
                hasher.update([0u8]);
                hasher.update(operator.as_bytes());
                hasher.update([0u8]);
                hasher.update(value.as_bytes());
                hasher.update([1u8]);
            }
        }
        format!("{:x}", hasher.finalize())[..16].to_string()
    }
}

/// Report every rule whose signature was already seen, against the first
/// rule that carried it.
pub fn check_redundant_rules(rule_base: &RuleBase) -> Vec<Finding> {
    let mut first_seen: HashMap<RuleSignature, &str> = HashMap::new();
    let mut findings = Vec::new();

    for rule in &rule_base.rules {
        let signature = RuleSignature::of(rule);
        match first_seen.get(&signature) {
            Some(original_id) => {
                findings.push(Finding::RedundantRule {
                    redundant_id: rule.id.clone(),
                    original_id: original_id.to_string(),
                    signature: signature.digest(),
                });
            }
            None => {
                first_seen.insert(signature, rule.id.as_str());
            }
        }
    }

    tracing::debug!(
        "{} distinct signatures, {} redundant rules",
        first_seen.len(),
        findings.len()
    );
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discount_rule(id: &str) -> Rule {
        Rule::new(id)
            .with_condition(Condition::new("price", Operator::Ge, 100.0))
            .with_condition(Condition::new("member", Operator::Eq, true))
            .with_effect(Effect::assign("discount", 10.0))
    }

    #[test]
    fn test_signature_ignores_order_and_metadata() {
        let a = discount_rule("R1").with_description("first");
        let b = Rule::new("R9")
            .with_description("something else")
            .with_condition(Condition::new("member", Operator::Eq, true))
            .with_condition(Condition::new("price", Operator::Ge, 100.0))
            .with_effect(Effect::assign("discount", 10.0));

        assert_eq!(RuleSignature::of(&a), RuleSignature::of(&b));
        assert_eq!(RuleSignature::of(&a).digest(), RuleSignature::of(&b).digest());
        assert_eq!(RuleSignature::of(&a).digest().len(), 16);
    }

    #[test]
    fn test_signature_separates_conditions_from_effects() {
        let a = Rule::new("R1").with_effect(Effect::assign("x", 1.0));
        let b = Rule::new("R2").with_condition(Condition::new("x", Operator::Eq, 1.0));

        assert_ne!(RuleSignature::of(&a), RuleSignature::of(&b));
    }

    #[test]
    fn test_first_seen_wins() {
        let rb = RuleBase::new(vec![
            discount_rule("R1"),
            discount_rule("R2"),
            Rule::new("R3").with_effect(Effect::assign("fee", 5.0)),
            discount_rule("R4"),
        ]);

        let findings = check_redundant_rules(&rb);
        let pairs: Vec<_> = findings
            .iter()
            .map(|f| match f {
                Finding::RedundantRule { redundant_id, original_id, .. } => {
                    (redundant_id.as_str(), original_id.as_str())
                }
                other => panic!("unexpected finding {:?}", other),
            })
            .collect();

        assert_eq!(pairs, vec![("R2", "R1"), ("R4", "R1")]);
    }

    #[test]
    fn test_duplicate_ids_are_processed_independently() {
        let rb = RuleBase::new(vec![discount_rule("R1"), discount_rule("R1")]);

        let findings = check_redundant_rules(&rb);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_different_values_are_not_redundant() {
        let rb = RuleBase::new(vec![
            discount_rule("R1"),
            Rule::new("R2")
                .with_condition(Condition::new("price", Operator::Ge, 100.0))
                .with_condition(Condition::new("member", Operator::Eq, true))
                .with_effect(Effect::assign("discount", 15.0)),
        ]);

        assert!(check_redundant_rules(&rb).is_empty());
    }

    #[test]
    fn test_integer_and_float_render_alike() {
        let a = Rule::new("R1").with_condition(Condition::new("x", Operator::Gt, 10i64));
        let b = Rule::new("R2").with_condition(Condition::new("x", Operator::Gt, 10.0));

        assert_eq!(RuleSignature::of(&a), RuleSignature::of(&b));
    }
}
