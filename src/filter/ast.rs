//! Filter expression tree
//!
//! Leaves compare one attribute against a value, compounds join children
//! with AND/OR, and `Exists` nodes express correlated lookups against a
//! related entity (produced by permission rules).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Leaf operator vocabulary (wire names are case-sensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "$eq")]
    Eq,
    #[serde(rename = "$ne")]
    Ne,
    #[serde(rename = "$in")]
    In,
    #[serde(rename = "$notIn")]
    NotIn,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$contains")]
    Contains,
    #[serde(rename = "$startsWith")]
    StartsWith,
    #[serde(rename = "$endsWith")]
    EndsWith,
    #[serde(rename = "$notContains")]
    NotContains,
    #[serde(rename = "$notStartsWith")]
    NotStartsWith,
    #[serde(rename = "$notEndsWith")]
    NotEndsWith,
    #[serde(rename = "$isNull")]
    IsNull,
}

impl Operator {
    pub const ALL: [Operator; 15] = [
        Operator::Eq,
        Operator::Ne,
        Operator::In,
        Operator::NotIn,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::NotContains,
        Operator::NotStartsWith,
        Operator::NotEndsWith,
        Operator::IsNull,
    ];

    /// Wire name, e.g. `$startsWith`
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::In => "$in",
            Operator::NotIn => "$notIn",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Contains => "$contains",
            Operator::StartsWith => "$startsWith",
            Operator::EndsWith => "$endsWith",
            Operator::NotContains => "$notContains",
            Operator::NotStartsWith => "$notStartsWith",
            Operator::NotEndsWith => "$notEndsWith",
            Operator::IsNull => "$isNull",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == name)
    }

    /// Comparison operators map directly to an SQL infix operator
    pub fn comparison_sql(&self) -> Option<&'static str> {
        match self {
            Operator::Eq => Some("="),
            Operator::Ne => Some("<>"),
            Operator::Lt => Some("<"),
            Operator::Lte => Some("<="),
            Operator::Gt => Some(">"),
            Operator::Gte => Some(">="),
            _ => None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Operator::Contains
                | Operator::StartsWith
                | Operator::EndsWith
                | Operator::NotContains
                | Operator::NotStartsWith
                | Operator::NotEndsWith
        )
    }

    pub fn is_negated_pattern(&self) -> bool {
        matches!(
            self,
            Operator::NotContains | Operator::NotStartsWith | Operator::NotEndsWith
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean junction of a compound node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Junction {
    #[serde(rename = "$and")]
    And,
    #[serde(rename = "$or")]
    Or,
}

impl Junction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Junction::And => "$and",
            Junction::Or => "$or",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "$and" => Some(Junction::And),
            "$or" => Some(Junction::Or),
            _ => None,
        }
    }
}

/// `attribute operator value`; `value: None` marks an undefined leaf
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub operator: Operator,
    pub value: Option<Value>,
}

/// Right-hand side of a lookup condition
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Bound literal
    Value(Value),
    /// Attribute of the outer (filtered) row
    Outer(String),
}

/// `target.attribute = operand`
#[derive(Debug, Clone, PartialEq)]
pub struct LookupCondition {
    pub attribute: String,
    pub operand: Operand,
}

/// Correlated existence check against another entity
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub entity: String,
    pub conditions: Vec<LookupCondition>,
}

/// Filter expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Leaf(Condition),
    Compound {
        kind: Junction,
        children: Vec<FilterNode>,
    },
    Exists(Lookup),
}

impl FilterNode {
    pub fn leaf(attribute: impl Into<String>, operator: Operator, value: Value) -> Self {
        FilterNode::Leaf(Condition {
            attribute: attribute.into(),
            operator,
            value: Some(value),
        })
    }

    /// A leaf whose value was never supplied; purification drops it
    pub fn undefined(attribute: impl Into<String>, operator: Operator) -> Self {
        FilterNode::Leaf(Condition {
            attribute: attribute.into(),
            operator,
            value: None,
        })
    }

    pub fn eq(attribute: impl Into<String>, value: Value) -> Self {
        Self::leaf(attribute, Operator::Eq, value)
    }

    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Compound {
            kind: Junction::And,
            children,
        }
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Compound {
            kind: Junction::Or,
            children,
        }
    }

    /// Attributes of the filtered entity referenced anywhere in the tree
    pub fn attributes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_attributes(&mut out);
        out
    }

    fn collect_attributes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterNode::Leaf(c) => out.push(&c.attribute),
            FilterNode::Compound { children, .. } => {
                for child in children {
                    child.collect_attributes(out);
                }
            }
            FilterNode::Exists(lookup) => {
                for cond in &lookup.conditions {
                    if let Operand::Outer(attr) = &cond.operand {
                        out.push(attr);
                    }
                }
            }
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Leaf(c) => match &c.value {
                Some(v) => write!(f, "{} {} {}", c.attribute, c.operator, v),
                None => write!(f, "{} {} undefined", c.attribute, c.operator),
            },
            FilterNode::Compound { kind, children } => {
                if children.is_empty() {
                    return match kind {
                        Junction::And => f.write_str("TRUE"),
                        Junction::Or => f.write_str("FALSE"),
                    };
                }
                let sep = match kind {
                    Junction::And => " AND ",
                    Junction::Or => " OR ",
                };
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
            FilterNode::Exists(lookup) => {
                write!(f, "EXISTS {}(", lookup.entity)?;
                for (i, cond) in lookup.conditions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match &cond.operand {
                        Operand::Value(v) => write!(f, "{} = {}", cond.attribute, v)?,
                        Operand::Outer(attr) => write!(f, "{} = outer.{}", cond.attribute, attr)?,
                    }
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_wire_names_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_wire(op.as_str()), Some(op));
        }
        assert_eq!(Operator::from_wire("$like"), None);
        assert_eq!(Operator::from_wire("$EQ"), None);
    }

    #[test]
    fn test_operator_serde_uses_wire_names() {
        let op: Operator = serde_json::from_str("\"$notStartsWith\"").unwrap();
        assert_eq!(op, Operator::NotStartsWith);
        assert_eq!(serde_json::to_string(&Operator::IsNull).unwrap(), "\"$isNull\"");
    }

    #[test]
    fn test_attributes_collected() {
        let node = FilterNode::and(vec![
            FilterNode::eq("username", json!("dana768")),
            FilterNode::or(vec![FilterNode::leaf("id", Operator::Gt, json!(3))]),
        ]);
        assert_eq!(node.attributes(), vec!["username", "id"]);
    }

    #[test]
    fn test_display() {
        let node = FilterNode::or(vec![
            FilterNode::eq("a", json!(1)),
            FilterNode::leaf("b", Operator::StartsWith, json!("jo")),
        ]);
        assert_eq!(node.to_string(), "(a $eq 1 OR b $startsWith \"jo\")");
        assert_eq!(FilterNode::or(vec![]).to_string(), "FALSE");
    }
}
