//! Filter evaluation against projected rows
//!
//! Mirrors SQL semantics: comparisons involving NULL are unknown, AND/OR
//! follow three-valued logic, and a row qualifies only when its predicate
//! is definitely true. `Exists` nodes scan the target entity's rows.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::filter::{Condition, FilterNode, Junction, Lookup, Operand, Operator};

use super::database::MemoryDatabase;
use super::errors::ExecutorResult;
use super::sorter::compare_sql;

/// `Some(true)`, `Some(false)` or unknown (`None`)
pub type Truth = Option<bool>;

/// Evaluates filter trees for rows of one entity
pub struct RowFilter<'a> {
    db: &'a MemoryDatabase<'a>,
    locale: &'a str,
}

impl<'a> RowFilter<'a> {
    pub fn new(db: &'a MemoryDatabase<'a>, locale: &'a str) -> Self {
        Self { db, locale }
    }

    /// Checks if a row qualifies (predicate definitely true)
    pub fn matches(&self, node: &FilterNode, row: &Map<String, Value>) -> ExecutorResult<bool> {
        Ok(self.evaluate(node, row)? == Some(true))
    }

    pub fn evaluate(&self, node: &FilterNode, row: &Map<String, Value>) -> ExecutorResult<Truth> {
        match node {
            FilterNode::Leaf(cond) => Ok(evaluate_condition(cond, row)),
            FilterNode::Compound { kind, children } => {
                let mut result = match kind {
                    Junction::And => Some(true),
                    Junction::Or => Some(false),
                };
                for child in children {
                    let value = self.evaluate(child, row)?;
                    result = match kind {
                        Junction::And => and(result, value),
                        Junction::Or => or(result, value),
                    };
                }
                Ok(result)
            }
            FilterNode::Exists(lookup) => self.exists(lookup, row).map(Some),
        }
    }

    fn exists(&self, lookup: &Lookup, outer: &Map<String, Value>) -> ExecutorResult<bool> {
        for candidate in self.db.rows(&lookup.entity, self.locale)? {
            let mut result = Some(true);
            for cond in &lookup.conditions {
                let target = candidate.get(&cond.attribute).unwrap_or(&Value::Null);
                let truth = match &cond.operand {
                    Operand::Value(Value::Null) => Some(target.is_null()),
                    Operand::Value(value) => equals(target, value),
                    Operand::Outer(name) => equals(target, outer.get(name).unwrap_or(&Value::Null)),
                };
                result = and(result, truth);
            }
            if result == Some(true) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn and(a: Truth, b: Truth) -> Truth {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or(a: Truth, b: Truth) -> Truth {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn not(a: Truth) -> Truth {
    a.map(|v| !v)
}

fn equals(a: &Value, b: &Value) -> Truth {
    if a.is_null() || b.is_null() {
        return None;
    }
    Some(compare_sql(a, b) == Some(Ordering::Equal))
}

fn evaluate_condition(cond: &Condition, row: &Map<String, Value>) -> Truth {
    let expected = match &cond.value {
        Some(value) => value,
        None => return Some(true),
    };
    let actual = row.get(&cond.attribute).unwrap_or(&Value::Null);

    match cond.operator {
        Operator::Eq if expected.is_null() => Some(actual.is_null()),
        Operator::Ne if expected.is_null() => Some(!actual.is_null()),
        Operator::Eq => equals(actual, expected),
        Operator::Ne => not(equals(actual, expected)),
        Operator::Lt => compare_sql(actual, expected).map(|o| o == Ordering::Less),
        Operator::Lte => compare_sql(actual, expected).map(|o| o != Ordering::Greater),
        Operator::Gt => compare_sql(actual, expected).map(|o| o == Ordering::Greater),
        Operator::Gte => compare_sql(actual, expected).map(|o| o != Ordering::Less),
        Operator::In => membership(actual, expected),
        Operator::NotIn => not(membership(actual, expected)),
        Operator::IsNull => Some(actual.is_null() == expected.as_bool().unwrap_or(true)),
        Operator::Contains
        | Operator::StartsWith
        | Operator::EndsWith
        | Operator::NotContains
        | Operator::NotStartsWith
        | Operator::NotEndsWith => pattern(cond.operator, actual, expected),
    }
}

/// `x IN (a, b, ...)` as a chain of ORed equalities
fn membership(actual: &Value, items: &Value) -> Truth {
    let items = match items.as_array() {
        Some(items) => items,
        None => return None,
    };
    items
        .iter()
        .fold(Some(false), |acc, item| or(acc, equals(actual, item)))
}

fn pattern(op: Operator, actual: &Value, needle: &Value) -> Truth {
    let text = match actual {
        Value::Null => return None,
        Value::String(s) => s.to_lowercase(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string().to_lowercase(),
    };
    let needle = needle.as_str()?.to_lowercase();

    let found = match op {
        Operator::StartsWith | Operator::NotStartsWith => text.starts_with(&needle),
        Operator::EndsWith | Operator::NotEndsWith => text.ends_with(&needle),
        _ => text.contains(&needle),
    };
    Some(found != op.is_negated_pattern())
}
