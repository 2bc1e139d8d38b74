//! Rule base ingestion: JSON wire format to the immutable model
//!
//! Loading is best-effort at the field level. A condition or effect with a
//! missing variable, an unknown operator or no usable value is dropped with a
//! log line; the rest of the rule base still loads. Only an unreadable or
//! unparseable document is an error.

use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as Json};
use std::path::{Path, PathBuf};
use thiserror::Error;
use crate::rules::model::*;

pub const MISSING_ID: &str = "<no-id>";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("rule base not found: {0:?}")]
    NotFound(PathBuf),

    #[error("failed to read rule base {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule base JSON")]
    Parse(#[from] serde_json::Error),

    #[error("invalid rule base shape: {0}")]
    InvalidShape(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawTriple {
    #[serde(default)]
    variable: Json,
    #[serde(default)]
    operator: Json,
    #[serde(default)]
    value: Json,
    #[serde(default)]
    expression: Json,
}

#[derive(Debug, Default, Deserialize)]
struct RawVariable {
    #[serde(default)]
    name: Json,
    #[serde(default, rename = "type")]
    var_type: Json,
    #[serde(default)]
    role: Json,
}

fn non_empty_str(v: &Json) -> Option<&str> {
    v.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Ids are kept as given; only a missing or non-scalar id becomes `<no-id>`
fn rule_id(v: Option<&Json>) -> String {
    match v {
        Some(Json::String(s)) => s.clone(),
        Some(Json::Number(n)) => n.to_string(),
        _ => MISSING_ID.to_string(),
    }
}

/// Array under `key`, or nothing. A field of the wrong type costs only
/// that field.
fn list_field<'a>(obj: &'a JsonMap<String, Json>, key: &str, owner: &str) -> &'a [Json] {
    match obj.get(key) {
        Some(Json::Array(items)) => items,
        None | Some(Json::Null) => &[],
        Some(other) => {
            tracing::warn!(
                "{}: ignoring '{}', expected an array, found {}",
                owner,
                key,
                json_kind(other)
            );
            &[]
        }
    }
}

fn parse_triple(raw: &Json) -> Option<RawTriple> {
    serde_json::from_value(raw.clone()).ok()
}

fn parse_condition(raw: &Json, rule_id: &str) -> Option<Condition> {
    let Some(triple) = parse_triple(raw) else {
        tracing::warn!("Rule {}: skipping non-object condition {}", rule_id, raw);
        return None;
    };
    let Some(variable) = non_empty_str(&triple.variable) else {
        tracing::debug!("Rule {}: skipping condition without variable", rule_id);
        return None;
    };
    let Some(operator) = triple.operator.as_str().and_then(Operator::parse) else {
        tracing::debug!(
            "Rule {}: skipping condition on '{}' with operator {}",
            rule_id,
            variable,
            triple.operator
        );
        return None;
    };
    let value = match &triple.value {
        Json::Number(n) => match n.as_f64() {
            Some(f) => Value::Number(f),
            None => return None,
        },
        Json::Bool(b) => Value::Boolean(*b),
        Json::String(s) => Value::Text(s.clone()),
        other => {
            tracing::debug!(
                "Rule {}: skipping condition on '{}' with value {}",
                rule_id,
                variable,
                other
            );
            return None;
        }
    };

    Some(Condition {
        variable: variable.to_string(),
        operator,
        value,
    })
}

fn parse_effect(raw: &Json, rule_id: &str) -> Option<Effect> {
    let Some(triple) = parse_triple(raw) else {
        tracing::warn!("Rule {}: skipping non-object effect {}", rule_id, raw);
        return None;
    };
    let Some(variable) = non_empty_str(&triple.variable) else {
        tracing::debug!("Rule {}: skipping effect without variable", rule_id);
        return None;
    };
    let operator = match triple.operator.as_str() {
        Some(op) => EffectOperator::parse(op),
        None => {
            tracing::debug!("Rule {}: skipping effect on '{}' without operator", rule_id, variable);
            return None;
        }
    };
    let raw_value = if triple.value.is_null() {
        &triple.expression
    } else {
        &triple.value
    };
    let value = match raw_value {
        Json::Number(n) => EffectValue::Number(n.as_f64()?),
        Json::Bool(b) => EffectValue::Boolean(*b),
        Json::String(s) => EffectValue::Formula(s.clone()),
        other => {
            tracing::debug!(
                "Rule {}: skipping effect on '{}' with value {}",
                rule_id,
                variable,
                other
            );
            return None;
        }
    };

    Some(Effect {
        variable: variable.to_string(),
        operator,
        value,
    })
}

fn parse_rule(raw: &Json, shape: RuleShape) -> Option<Rule> {
    let Some(obj) = raw.as_object() else {
        tracing::warn!("Skipping non-object rule entry {}", raw);
        return None;
    };
    let id = rule_id(obj.get("id"));
    let owner = format!("Rule {}", id);

    let description = match obj.get("description") {
        None | Some(Json::Null) => None,
        Some(Json::String(s)) => Some(s.clone()),
        Some(other) => {
            tracing::warn!("{}: ignoring description of type {}", owner, json_kind(other));
            None
        }
    };

    // both spellings occur; the first usable one wins
    let causes = if matches!(obj.get("causes"), Some(Json::Array(_))) {
        list_field(obj, "causes", &owner)
    } else {
        list_field(obj, "Causes", &owner)
    };
    let conditions = causes
        .iter()
        .filter_map(|c| parse_condition(c, &id))
        .collect();

    let effects = list_field(obj, "effects", &owner);
    let effects = match shape {
        RuleShape::Plain => effects.iter().collect::<Vec<_>>(),
        // `rules` is the current name, `effects` the legacy one
        RuleShape::Question => list_field(obj, "rules", &owner)
            .iter()
            .chain(effects.iter())
            .collect(),
    }
    .into_iter()
    .filter_map(|e| parse_effect(e, &id))
    .collect();

    let question = list_field(obj, "question", &owner)
        .iter()
        .filter_map(|q| parse_effect(q, &id))
        .collect();

    Some(Rule {
        id,
        description,
        shape,
        conditions,
        effects,
        question,
    })
}

fn parse_variable(raw: &Json) -> Option<Variable> {
    let raw: RawVariable = serde_json::from_value(raw.clone()).ok()?;
    let name = non_empty_str(&raw.name)?;
    let var_type = raw
        .var_type
        .as_str()
        .and_then(VariableType::parse)
        .unwrap_or(VariableType::Numeric);
    let role = raw
        .role
        .as_str()
        .and_then(VariableRole::parse)
        .unwrap_or(VariableRole::Derived);
    Some(Variable::new(name, var_type, role))
}

/// Parse a rule base from JSON text. `inputs` come first, then `outputs`.
pub fn parse_rule_base(json: &str) -> Result<RuleBase, LoadError> {
    let doc: Json = serde_json::from_str(json)?;
    let Some(obj) = doc.as_object() else {
        return Err(LoadError::InvalidShape(format!(
            "expected a JSON object at top level, found {}",
            json_kind(&doc)
        )));
    };

    let variables: Vec<Variable> = list_field(obj, "variables", "Rule base")
        .iter()
        .filter_map(parse_variable)
        .collect();
    let rules: Vec<Rule> = list_field(obj, "inputs", "Rule base")
        .iter()
        .filter_map(|r| parse_rule(r, RuleShape::Plain))
        .chain(
            list_field(obj, "outputs", "Rule base")
                .iter()
                .filter_map(|r| parse_rule(r, RuleShape::Question)),
        )
        .collect();

    tracing::debug!(
        "Parsed {} variables, {} rules",
        variables.len(),
        rules.len()
    );

    Ok(RuleBase { variables, rules })
}

/// Load a rule base from a JSON file
pub fn load_rule_base<P: AsRef<Path>>(path: P) -> Result<RuleBase, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rule_base = parse_rule_base(&content)?;
    tracing::info!("Loaded {} rules from {:?}", rule_base.len(), path);
    Ok(rule_base)
}

fn json_kind(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "variables": [
            {"name": "price_goods", "type": "decimal", "role": "input"},
            {"name": "discount", "type": "decimal", "role": "eternal-truth"},
            {"type": "decimal", "role": "input"}
        ],
        "inputs": [
            {
                "id": "R1",
                "description": "10% off from 100",
                "Causes": [
                    {"variable": "price_goods", "operator": ">=", "value": 100},
                    {"variable": "price_goods", "operator": "~", "value": 3},
                    {"operator": "<", "value": 3},
                    {"variable": "tier", "operator": "==", "value": null}
                ],
                "effects": [
                    {"variable": "discount", "operator": "=", "value": 0.1, "raw": "10% discount"}
                ]
            },
            {
                "id": 7,
                "causes": [{"variable": "member", "operator": "==", "value": true}],
                "effects": [{"variable": "total", "operator": "=", "expression": "a + b"}]
            }
        ],
        "outputs": [
            {
                "id": "R3",
                "question": [{"variable": "price_to_be_paid", "operator": "=", "value": "?"}],
                "rules": [{"variable": "price_to_be_paid", "operator": "=", "value": "price_goods+shipping"}],
                "effects": [{"variable": "legacy", "operator": "=", "value": 1}]
            },
            {}
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let rb = parse_rule_base(SAMPLE).unwrap();

        assert_eq!(rb.variables.len(), 2);
        assert_eq!(rb.variables[1].role, VariableRole::Derived);

        let ids: Vec<_> = rb.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "7", "R3", MISSING_ID]);

        let r1 = &rb.rules[0];
        assert_eq!(r1.shape, RuleShape::Plain);
        assert_eq!(r1.description.as_deref(), Some("10% off from 100"));
        assert_eq!(r1.conditions, vec![Condition::new("price_goods", Operator::Ge, 100.0)]);
        assert_eq!(r1.effects, vec![Effect::assign("discount", 0.1)]);

        let r2 = &rb.rules[1];
        assert_eq!(r2.conditions[0].value, Value::Boolean(true));
        assert_eq!(r2.effects[0].value, EffectValue::Formula("a + b".to_string()));
    }

    #[test]
    fn test_question_rules_flatten_rules_then_effects() {
        let rb = parse_rule_base(SAMPLE).unwrap();
        let r3 = &rb.rules[2];

        assert_eq!(r3.shape, RuleShape::Question);
        let vars: Vec<_> = r3.effects.iter().map(|e| e.variable.as_str()).collect();
        assert_eq!(vars, vec!["price_to_be_paid", "legacy"]);
        assert_eq!(r3.question.len(), 1);
    }

    #[test]
    fn test_empty_document_is_an_empty_rule_base() {
        let rb = parse_rule_base("{}").unwrap();
        assert!(rb.is_empty());
        assert!(rb.variables.is_empty());
    }

    #[test]
    fn test_non_object_entries_are_skipped() {
        let rb = parse_rule_base(
            r#"{"inputs": [
                "not a rule",
                {"id": "R1", "Causes": [42, {"variable": "x", "operator": ">", "value": 1}]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(rb.len(), 1);
        assert_eq!(rb.rules[0].conditions.len(), 1);
    }

    #[test]
    fn test_bad_field_costs_only_that_field() {
        let rb = parse_rule_base(
            r#"{"inputs": [
                {
                    "id": "R1",
                    "description": 42,
                    "Causes": [
                        {"variable": "v", "operator": ">", "value": 200},
                        {"variable": "v", "operator": "<", "value": 150}
                    ],
                    "effects": null
                },
                {
                    "id": "R2",
                    "causes": [{"variable": "w", "operator": ">", "value": 1}],
                    "Causes": [{"variable": "w", "operator": "<", "value": 0}],
                    "effects": {"variable": "fee", "operator": "=", "value": 5}
                }
            ]}"#,
        )
        .unwrap();

        assert_eq!(rb.len(), 2);
        let r1 = &rb.rules[0];
        assert_eq!(r1.description, None);
        assert_eq!(r1.conditions.len(), 2);
        assert!(r1.effects.is_empty());

        let r2 = &rb.rules[1];
        assert_eq!(r2.conditions, vec![Condition::new("w", Operator::Gt, 1.0)]);
        assert!(r2.effects.is_empty());

        let findings = crate::rules::contradiction::check_self_contradictions(&rb);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_ids(), vec!["R1"]);
    }

    #[test]
    fn test_top_level_field_of_wrong_type_is_ignored() {
        let rb = parse_rule_base(
            r#"{"variables": "none", "inputs": [{"id": "R1"}], "outputs": null}"#,
        )
        .unwrap();

        assert!(rb.variables.is_empty());
        assert_eq!(rb.len(), 1);
    }

    #[test]
    fn test_ids_are_kept_as_given() {
        let rb = parse_rule_base(
            r#"{"inputs": [{"id": "  "}, {"id": ""}, {"id": true}, {"id": 3.5}]}"#,
        )
        .unwrap();

        let ids: Vec<_> = rb.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["  ", "", MISSING_ID, "3.5"]);
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        assert!(matches!(parse_rule_base("{ nope"), Err(LoadError::Parse(_))));
        assert!(matches!(parse_rule_base("[1, 2]"), Err(LoadError::InvalidShape(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let rb = load_rule_base(file.path()).unwrap();
        assert_eq!(rb.len(), 4);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rule_base(dir.path().join("requirements.json")).unwrap_err();

        assert!(matches!(err, LoadError::NotFound(_)));
        assert!(err.to_string().contains("requirements.json"));
    }
}
