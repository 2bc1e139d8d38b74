//! Core rule base types: variables, conditions, effects and rules

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inferred role of a variable. Advisory only, checkers never enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableRole {
    Input,
    Output,
    Derived,
}

impl VariableRole {
    /// Parse a wire role name. `eternal-truth` is the legacy name for derived.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "input" => Some(Self::Input),
            "output" => Some(Self::Output),
            "derived" | "eternal-truth" => Some(Self::Derived),
            _ => None,
        }
    }

    /// Priority used when one name shows up in several roles
    pub fn priority(&self) -> u8 {
        match self {
            VariableRole::Output => 3,
            VariableRole::Input => 2,
            VariableRole::Derived => 1,
        }
    }
}

/// Coarse variable type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableType {
    Numeric,
    Boolean,
    StringFormula,
}

impl VariableType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "numeric" | "decimal" | "number" | "integer" => Some(Self::Numeric),
            "boolean" | "bool" => Some(Self::Boolean),
            "string-formula" | "formula" | "string" => Some(Self::StringFormula),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    pub role: VariableRole,
}

impl Variable {
    pub fn new(name: &str, var_type: VariableType, role: VariableRole) -> Self {
        Self {
            name: name.to_string(),
            var_type,
            role,
        }
    }
}

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl Operator {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
        }
    }

    /// Returns true if the operator narrows a numeric interval.
    /// `!=` punches a hole rather than narrowing, so it has no interval form.
    pub fn is_interval(&self) -> bool {
        !matches!(self, Operator::Ne)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// One comparison in a rule's premise (a.k.a. cause)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub variable: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(variable: &str, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            variable: variable.to_string(),
            operator,
            value: value.into(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.variable, self.operator, self.value)
    }
}

/// Effect operator. Only assignment exists today; anything else is kept
/// verbatim so redundancy signatures still see it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffectOperator {
    Assign,
    Other(String),
}

impl From<String> for EffectOperator {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<EffectOperator> for String {
    fn from(op: EffectOperator) -> Self {
        op.symbol().to_string()
    }
}

impl EffectOperator {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "=" => Self::Assign,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            EffectOperator::Assign => "=",
            EffectOperator::Other(s) => s.as_str(),
        }
    }
}

/// Value produced by an effect: a literal, or a formula over other variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectValue {
    Number(f64),
    Boolean(bool),
    Formula(String),
}

impl EffectValue {
    pub fn as_formula(&self) -> Option<&str> {
        match self {
            EffectValue::Formula(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for EffectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectValue::Number(n) => write!(f, "{}", n),
            EffectValue::Boolean(b) => write!(f, "{}", b),
            EffectValue::Formula(s) => f.write_str(s),
        }
    }
}

impl From<f64> for EffectValue {
    fn from(n: f64) -> Self {
        EffectValue::Number(n)
    }
}

impl From<i64> for EffectValue {
    fn from(n: i64) -> Self {
        EffectValue::Number(n as f64)
    }
}

impl From<bool> for EffectValue {
    fn from(b: bool) -> Self {
        EffectValue::Boolean(b)
    }
}

impl From<&str> for EffectValue {
    fn from(s: &str) -> Self {
        EffectValue::Formula(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub variable: String,
    pub operator: EffectOperator,
    pub value: EffectValue,
}

impl Effect {
    pub fn assign(variable: &str, value: impl Into<EffectValue>) -> Self {
        Self {
            variable: variable.to_string(),
            operator: EffectOperator::Assign,
            value: value.into(),
        }
    }

    pub fn is_assignment(&self) -> bool {
        self.operator == EffectOperator::Assign
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.variable, self.operator.symbol(), self.value)
    }
}

/// Which wire shape a rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleShape {
    /// `inputs[*]`: conditions plus effects
    #[default]
    Plain,
    /// `outputs[*]`: conditions, question, and rules flattened into effects
    Question,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub description: Option<String>,
    pub shape: RuleShape,
    pub conditions: Vec<Condition>,
    pub effects: Vec<Effect>,
    /// Expected output of a question rule. Carried along, never checked.
    pub question: Vec<Effect>,
}

impl Rule {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            description: None,
            shape: RuleShape::Plain,
            conditions: Vec::new(),
            effects: Vec::new(),
            question: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_shape(mut self, shape: RuleShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_question(mut self, effect: Effect) -> Self {
        self.question.push(effect);
        self
    }

    /// Effects that assign a value (`=`)
    pub fn assignments(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter().filter(|e| e.is_assignment())
    }
}

/// Immutable snapshot of the rules under analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleBase {
    pub variables: Vec<Variable>,
    pub rules: Vec<Rule>,
}

impl RuleBase {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            variables: Vec::new(),
            rules,
        }
    }

    pub fn with_variables(mut self, variables: Vec<Variable>) -> Self {
        self.variables = variables;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Derive a variable table from rule usage.
    ///
    /// Condition variables are inputs, question variables outputs and effect
    /// variables derived; when a name plays several roles the higher
    /// priority one wins (output > input > derived).
    pub fn inferred_variables(&self) -> Vec<Variable> {
        use std::collections::{BTreeMap, HashSet};

        let mut best_role: BTreeMap<&str, VariableRole> = BTreeMap::new();
        let mut formulas: HashSet<&str> = HashSet::new();

        for rule in &self.rules {
            for c in &rule.conditions {
                promote(&mut best_role, &c.variable, VariableRole::Input);
            }
            for q in &rule.question {
                promote(&mut best_role, &q.variable, VariableRole::Output);
            }
            for e in &rule.effects {
                promote(&mut best_role, &e.variable, VariableRole::Derived);
                if matches!(e.value, EffectValue::Formula(_)) {
                    formulas.insert(e.variable.as_str());
                }
            }
        }

        best_role
            .into_iter()
            .map(|(name, role)| {
                let var_type = if name.starts_with("is_") || name.ends_with("_flag") {
                    VariableType::Boolean
                } else if formulas.contains(name) {
                    VariableType::StringFormula
                } else {
                    VariableType::Numeric
                };
                Variable::new(name, var_type, role)
            })
            .collect()
    }

    /// Declared variables, or the inferred table when none are declared
    pub fn variables_or_inferred(&self) -> Vec<Variable> {
        if self.variables.is_empty() {
            self.inferred_variables()
        } else {
            self.variables.clone()
        }
    }
}

fn promote<'a>(
    best_role: &mut std::collections::BTreeMap<&'a str, VariableRole>,
    name: &'a str,
    role: VariableRole,
) {
    match best_role.get(name) {
        Some(current) if current.priority() >= role.priority() => {}
        _ => {
            best_role.insert(name, role);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse_roundtrip() {
        for op in [
            Operator::Lt,
            Operator::Le,
            Operator::Gt,
            Operator::Ge,
            Operator::Eq,
            Operator::Ne,
        ] {
            assert_eq!(Operator::parse(op.symbol()), Some(op));
        }
        assert_eq!(Operator::parse("=>"), None);
        assert!(!Operator::Ne.is_interval());
    }

    #[test]
    fn test_role_and_type_aliases() {
        assert_eq!(VariableRole::parse("eternal-truth"), Some(VariableRole::Derived));
        assert_eq!(VariableRole::parse("Output"), Some(VariableRole::Output));
        assert_eq!(VariableType::parse("decimal"), Some(VariableType::Numeric));
        assert_eq!(VariableType::parse("formula"), Some(VariableType::StringFormula));
        assert_eq!(VariableType::parse("matrix"), None);
    }

    #[test]
    fn test_rule_builder() {
        let rule = Rule::new("R1")
            .with_description("adults")
            .with_condition(Condition::new("age", Operator::Ge, 18.0))
            .with_effect(Effect::assign("status", "adult"))
            .with_effect(Effect {
                variable: "log".to_string(),
                operator: EffectOperator::parse("+="),
                value: EffectValue::Number(1.0),
            });

        assert_eq!(rule.conditions.len(), 1);
        assert_eq!(rule.assignments().count(), 1);
        assert_eq!(rule.conditions[0].to_string(), "age >= 18");
    }

    #[test]
    fn test_inferred_variables_role_priority() {
        let rb = RuleBase::new(vec![
            Rule::new("R1")
                .with_condition(Condition::new("price", Operator::Ge, 100.0))
                .with_effect(Effect::assign("discount", 10.0)),
            Rule::new("R2")
                .with_shape(RuleShape::Question)
                .with_condition(Condition::new("discount", Operator::Gt, 0.0))
                .with_question(Effect::assign("price_to_pay", "?"))
                .with_effect(Effect::assign("price_to_pay", "price+discount"))
                .with_effect(Effect::assign("is_member", true)),
        ]);

        let vars = rb.inferred_variables();
        let find = |n: &str| vars.iter().find(|v| v.name == n).cloned();

        assert_eq!(find("price").map(|v| v.role), Some(VariableRole::Input));
        // input beats derived
        assert_eq!(find("discount").map(|v| v.role), Some(VariableRole::Input));
        let pay = find("price_to_pay").unwrap();
        assert_eq!(pay.role, VariableRole::Output);
        assert_eq!(pay.var_type, VariableType::StringFormula);
        assert_eq!(find("is_member").map(|v| v.var_type), Some(VariableType::Boolean));
    }

    #[test]
    fn test_declared_variables_win() {
        let rb = RuleBase::new(vec![Rule::new("R1")
            .with_condition(Condition::new("x", Operator::Lt, 1.0))])
        .with_variables(vec![Variable::new("y", VariableType::Numeric, VariableRole::Input)]);

        let vars = rb.variables_or_inferred();
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].name, "y");
    }
}
