//! Visibility predicates over sibling field values.
//!
//! A condition map has the shape `{field: value | [values] | [operator, value]}`.
//! Every entry must hold for the owning field to be active.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{BuilderError, BuilderResult};

/// Comparison operator used by the explicit `[operator, value]` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    Contains,
    NotContains,
}

/// Characters that mark the first element of a two-item array as an operator.
const OPERATOR_LEADS: &[char] = &['!', '<', '>', '=', '~'];

impl Operator {
    pub fn parse(token: &str) -> Option<Self> {
        let op = match token {
            "==" | "=" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            "in" => Operator::In,
            "!in" => Operator::NotIn,
            "contains" => Operator::Contains,
            "!contains" => Operator::NotContains,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::In => "in",
            Operator::NotIn => "!in",
            Operator::Contains => "contains",
            Operator::NotContains => "!contains",
        }
    }

    fn looks_like_operator(token: &str) -> bool {
        Operator::parse(token).is_some() || token.starts_with(OPERATOR_LEADS)
    }
}

/// A single predicate on one sibling field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Value),
    OneOf(Vec<Value>),
    Compare(Operator, Value),
}

impl Condition {
    /// Parse the wire form of a predicate for `field`.
    pub fn from_value(field: &str, value: &Value) -> BuilderResult<Self> {
        match value {
            Value::Array(items) => {
                if let [Value::String(token), operand] = items.as_slice() {
                    if Operator::looks_like_operator(token) {
                        return Operator::parse(token)
                            .map(|op| Condition::Compare(op, operand.clone()))
                            .ok_or_else(|| BuilderError::UnknownOperator {
                                field: field.to_string(),
                                operator: token.clone(),
                            });
                    }
                }
                Ok(Condition::OneOf(items.clone()))
            }
            other => Ok(Condition::Equals(other.clone())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Condition::Equals(v) => v.clone(),
            Condition::OneOf(values) => Value::Array(values.clone()),
            Condition::Compare(op, v) => {
                Value::Array(vec![Value::String(op.as_str().to_string()), v.clone()])
            }
        }
    }

    /// Whether `actual` (the sibling's current value, `Null` when unset) satisfies the predicate.
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Condition::Equals(expected) => loose_eq(actual, expected),
            Condition::OneOf(values) => in_set(actual, values),
            Condition::Compare(op, expected) => match op {
                Operator::Eq => loose_eq(actual, expected),
                Operator::Ne => !loose_eq(actual, expected),
                Operator::Gt => compare(actual, expected, |a, b| a > b),
                Operator::Ge => compare(actual, expected, |a, b| a >= b),
                Operator::Lt => compare(actual, expected, |a, b| a < b),
                Operator::Le => compare(actual, expected, |a, b| a <= b),
                Operator::In => match expected {
                    Value::Array(values) => in_set(actual, values),
                    single => loose_eq(actual, single),
                },
                Operator::NotIn => match expected {
                    Value::Array(values) => !in_set(actual, values),
                    single => !loose_eq(actual, single),
                },
                Operator::Contains => contains(actual, expected),
                Operator::NotContains => !contains(actual, expected),
            },
        }
    }
}

/// All predicates attached to a field, keyed by sibling field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions(IndexMap<String, Condition>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, condition: Condition) {
        self.0.insert(field.into(), condition);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Condition)> {
        self.0.iter()
    }

    /// Parse a `{field: predicate}` object.
    pub fn from_value(value: &Value) -> BuilderResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            BuilderError::config("condition", "condition must be an object of field predicates")
        })?;
        let mut conditions = Conditions::new();
        for (field, predicate) in map {
            conditions.insert(field.clone(), Condition::from_value(field, predicate)?);
        }
        Ok(conditions)
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, c)| (k.clone(), c.to_value()))
            .collect();
        Value::Object(map)
    }

    /// True when every predicate holds against `siblings`. Missing siblings read as `Null`.
    pub fn evaluate(&self, siblings: &Map<String, Value>) -> bool {
        self.0.iter().all(|(field, condition)| {
            let actual = siblings.get(field).unwrap_or(&Value::Null);
            condition.matches(actual)
        })
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_flag(value: &Value) -> Option<bool> {
    super::validate::parse_flag(value)
}

fn loose_eq(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::Bool(_), _) | (_, Value::Bool(_)) => {
            matches!((as_flag(actual), as_flag(expected)), (Some(a), Some(b)) if a == b)
        }
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        _ => matches!((as_number(actual), as_number(expected)), (Some(a), Some(b)) if a == b),
    }
}

fn in_set(actual: &Value, values: &[Value]) -> bool {
    match actual {
        // Multi-select values match when any selected option is in the set.
        Value::Array(selected) => selected
            .iter()
            .any(|item| values.iter().any(|v| loose_eq(item, v))),
        single => values.iter().any(|v| loose_eq(single, v)),
    }
}

fn compare(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (as_number(actual), as_number(expected)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Array(items), needle) => items.iter().any(|item| loose_eq(item, needle)),
        (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
        _ => false,
    }
}
