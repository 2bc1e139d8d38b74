//! Variable names that probably denote the same quantity
//!
//! Advisory check. Two names are similar when their normalized Levenshtein
//! similarity reaches the threshold, or when they share a `_`-separated
//! token. Connected groups of similar names are reported together.

use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use crate::rules::findings::Finding;
use crate::rules::model::RuleBase;

#[derive(Debug, Clone, Deserialize)]
pub struct NamingConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_true")]
    pub token_overlap: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            token_overlap: default_true(),
        }
    }
}

fn default_threshold() -> f64 {
    0.8
}

fn default_true() -> bool {
    true
}

/// Every variable name mentioned anywhere in the rule base, sorted
pub fn collect_variable_names(rule_base: &RuleBase) -> Vec<String> {
    let mut names: BTreeSet<&str> = BTreeSet::new();

    for variable in &rule_base.variables {
        names.insert(variable.name.as_str());
    }
    for rule in &rule_base.rules {
        names.extend(rule.conditions.iter().map(|c| c.variable.as_str()));
        names.extend(rule.effects.iter().map(|e| e.variable.as_str()));
        names.extend(rule.question.iter().map(|q| q.variable.as_str()));
    }

    names.into_iter().map(str::to_string).collect()
}

fn tokens(name: &str) -> HashSet<String> {
    name.to_lowercase()
        .split('_')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn names_similar(a: &str, b: &str, config: &NamingConfig) -> bool {
    if strsim::normalized_levenshtein(a, b) >= config.threshold {
        return true;
    }
    config.token_overlap && !tokens(a).is_disjoint(&tokens(b))
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Group similar names and report each group of two or more
pub fn check_similar_names(rule_base: &RuleBase, config: &NamingConfig) -> Vec<Finding> {
    let names = collect_variable_names(rule_base);
    let mut parent: Vec<usize> = (0..names.len()).collect();

    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            if names_similar(&names[i], &names[j], config) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj.max(ri)] = rj.min(ri);
                }
            }
        }
    }

    let mut groups: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for (i, name) in names.iter().enumerate() {
        let root = find(&mut parent, i);
        groups[root].push(name.clone());
    }

    let findings: Vec<Finding> = groups
        .into_iter()
        .filter(|g| g.len() > 1)
        .map(|variables| Finding::SimilarNames { variables })
        .collect();

    tracing::debug!(
        "Compared {} variable names, {} similar groups",
        names.len(),
        findings.len()
    );
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::model::*;

    fn rule_base_with(names: &[&str]) -> RuleBase {
        RuleBase::new(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    Rule::new(&format!("R{}", i))
                        .with_condition(Condition::new(n, Operator::Gt, 0.0))
                })
                .collect(),
        )
    }

    #[test]
    fn test_token_overlap_groups() {
        let rb = rule_base_with(&["total_price", "price_eur", "age"]);

        let findings = check_similar_names(&rb, &NamingConfig::default());
        assert_eq!(
            findings,
            vec![Finding::SimilarNames {
                variables: vec!["price_eur".to_string(), "total_price".to_string()],
            }]
        );
    }

    #[test]
    fn test_edit_distance_similarity() {
        let config = NamingConfig {
            threshold: 0.8,
            token_overlap: false,
        };
        assert!(names_similar("discount", "discont", &config));
        assert!(!names_similar("discount", "delivery", &config));
        assert!(!names_similar("total_price", "price_eur", &config));
    }

    #[test]
    fn test_groups_are_transitive() {
        let rb = rule_base_with(&["gross_price", "price_net", "net_weight", "age"]);

        let findings = check_similar_names(&rb, &NamingConfig::default());
        assert_eq!(findings.len(), 1);
        match &findings[0] {
            Finding::SimilarNames { variables } => assert_eq!(variables.len(), 3),
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn test_names_collected_from_all_places() {
        let rb = RuleBase::new(vec![Rule::new("R1")
            .with_condition(Condition::new("a", Operator::Gt, 0.0))
            .with_effect(Effect::assign("b", 1.0))
            .with_question(Effect::assign("c", "?"))])
        .with_variables(vec![Variable::new("d", VariableType::Numeric, VariableRole::Input)]);

        assert_eq!(collect_variable_names(&rb), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_config_defaults_from_toml() {
        let config: NamingConfig = toml::from_str("").unwrap();
        assert_eq!(config.threshold, 0.8);
        assert!(config.token_overlap);
    }
}
