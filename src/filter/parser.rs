//! Wire filter parser
//!
//! Accepted forms:
//! - `{"attr": value}` (implicit `$eq`)
//! - `{"attr": {"$op": value, ...}}` (several operators are AND-ed)
//! - `{"$and": [...]}`, `{"$or": [...]}`
//! - several keys in one object are AND-ed
//!
//! Attribute existence and capabilities are checked later by the compiler.

use serde_json::{Map, Value};

use crate::errors::{PlanError, PlanResult};

use super::ast::{FilterNode, Junction, Operator};

/// Parses a JSON filter; `null` means "no constraint"
pub fn parse_filter(value: &Value) -> PlanResult<FilterNode> {
    match value {
        Value::Null => Ok(FilterNode::and(Vec::new())),
        Value::Object(map) => parse_object(map),
        other => Err(PlanError::invalid_value(
            "",
            "filter",
            format!("expected an object, got {}", other),
        )),
    }
}

fn parse_object(map: &Map<String, Value>) -> PlanResult<FilterNode> {
    let mut nodes = Vec::with_capacity(map.len());

    for (key, value) in map {
        if let Some(kind) = Junction::from_wire(key) {
            nodes.push(parse_junction(kind, value)?);
        } else if key.starts_with('$') {
            return Err(PlanError::unknown_operator("", key));
        } else {
            nodes.push(parse_attribute(key, value)?);
        }
    }

    if nodes.len() == 1 {
        Ok(nodes.remove(0))
    } else {
        Ok(FilterNode::and(nodes))
    }
}

fn parse_junction(kind: Junction, value: &Value) -> PlanResult<FilterNode> {
    let items = value.as_array().ok_or_else(|| {
        PlanError::invalid_value("", kind.as_str(), "expected an array of filters")
    })?;

    let children = items.iter().map(parse_filter).collect::<PlanResult<Vec<_>>>()?;

    Ok(FilterNode::Compound { kind, children })
}

fn parse_attribute(attribute: &str, value: &Value) -> PlanResult<FilterNode> {
    let operators = match value {
        Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => map,
        _ => return Ok(FilterNode::eq(attribute, value.clone())),
    };

    let mut leaves = Vec::with_capacity(operators.len());
    for (name, operand) in operators {
        let op = Operator::from_wire(name)
            .ok_or_else(|| PlanError::unknown_operator(attribute, name))?;
        leaves.push(FilterNode::leaf(attribute, op, operand.clone()));
    }

    if leaves.len() == 1 {
        Ok(leaves.remove(0))
    } else {
        Ok(FilterNode::and(leaves))
    }
}
