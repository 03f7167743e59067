//! Filter compiler
//!
//! Turns a [`FilterNode`] into a parameterized SQL [`Fragment`]. The tree is
//! purified first; every value is bound as a parameter.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{PlanError, PlanResult};
use crate::schema::{AttributeMeta, AttributeType, Catalog};
use crate::sql::{escape_like, quote_identifier, Fragment, Shaper};

use super::ast::{Condition, FilterNode, Junction, Lookup, Operand, Operator};

/// Compiles filter trees for one entity alias
pub struct FilterCompiler<'a> {
    catalog: &'a Catalog,
    shaper: Shaper<'a>,
    check_capabilities: bool,
    lookups: usize,
}

impl<'a> FilterCompiler<'a> {
    /// Compiler that enforces attribute capabilities (caller filters)
    pub fn new(catalog: &'a Catalog, shaper: Shaper<'a>) -> Self {
        Self {
            catalog,
            shaper,
            check_capabilities: true,
            lookups: 0,
        }
    }

    /// Skips capability checks for internally generated predicates
    pub fn trusted(mut self) -> Self {
        self.check_capabilities = false;
        self
    }

    /// Starts lookup alias numbering after `n`, keeping aliases unique
    /// across compilers that feed the same statement
    pub fn with_lookup_offset(mut self, n: usize) -> Self {
        self.lookups = n;
        self
    }

    pub fn lookups_emitted(&self) -> usize {
        self.lookups
    }

    pub fn compile(&mut self, node: &FilterNode) -> PlanResult<Fragment> {
        let fragment = match node.clone().purify() {
            Some(pure) => self.compile_node(&pure)?,
            None => Fragment::always_true(),
        };
        debug!(
            entity = %self.shaper.entity().name,
            params = fragment.param_count(),
            "compiled filter"
        );
        Ok(fragment)
    }

    fn compile_node(&mut self, node: &FilterNode) -> PlanResult<Fragment> {
        match node {
            FilterNode::Leaf(cond) => self.compile_condition(cond),
            FilterNode::Compound { kind, children } => {
                let fragments = children
                    .iter()
                    .map(|child| self.compile_node(child))
                    .collect::<PlanResult<Vec<_>>>()?;
                Ok(match kind {
                    Junction::And => Fragment::all(fragments),
                    Junction::Or => Fragment::any(fragments),
                })
            }
            FilterNode::Exists(lookup) => self.compile_lookup(lookup),
        }
    }

    fn compile_condition(&self, cond: &Condition) -> PlanResult<Fragment> {
        let (attr, expr) = self.shaper.resolve(&cond.attribute)?;
        let op = cond.operator;

        if self.check_capabilities && !attr.supports(op) {
            return Err(PlanError::unknown_operator(&attr.name, op.as_str()));
        }

        let value = match &cond.value {
            Some(value) => value,
            None => return Ok(Fragment::always_true()),
        };

        match op {
            Operator::Eq | Operator::Ne if value.is_null() => {
                let test = if op == Operator::Eq { "IS NULL" } else { "IS NOT NULL" };
                Ok(Fragment::sql(format!("{} {}", expr, test)))
            }
            Operator::Eq
            | Operator::Ne
            | Operator::Lt
            | Operator::Lte
            | Operator::Gt
            | Operator::Gte => {
                require_scalar(attr, op, value)?;
                if self.check_capabilities {
                    require_typed(attr, op, value)?;
                }
                let sql_op = op.comparison_sql().unwrap_or("=");
                let mut fragment = Fragment::sql(format!("{} {} ", expr, sql_op));
                fragment.push_param(value.clone());
                Ok(fragment)
            }
            Operator::In | Operator::NotIn => {
                let fragment = compile_membership(attr, op, &expr, value)?;
                if self.check_capabilities {
                    for item in value.as_array().into_iter().flatten() {
                        require_typed(attr, op, item)?;
                    }
                }
                Ok(fragment)
            }
            Operator::IsNull => {
                let is_null = value.as_bool().ok_or_else(|| {
                    PlanError::invalid_value(&attr.name, op.as_str(), "expected a boolean")
                })?;
                let test = if is_null { "IS NULL" } else { "IS NOT NULL" };
                Ok(Fragment::sql(format!("{} {}", expr, test)))
            }
            Operator::Contains
            | Operator::StartsWith
            | Operator::EndsWith
            | Operator::NotContains
            | Operator::NotStartsWith
            | Operator::NotEndsWith => compile_pattern(attr, op, &expr, value),
        }
    }

    fn compile_lookup(&mut self, lookup: &Lookup) -> PlanResult<Fragment> {
        let target = self.catalog.entity(&lookup.entity)?;
        self.lookups += 1;
        let alias = format!("{}_lookup_{}", target.table, self.lookups);
        let inner = Shaper::new(target, &alias, self.shaper.locale());

        let mut conditions = Vec::with_capacity(lookup.conditions.len());
        for cond in &lookup.conditions {
            let (attr, target_expr) = inner.resolve(&cond.attribute)?;
            if attr.is_reference() {
                return Err(PlanError::invalid_value(
                    &attr.name,
                    "lookup",
                    "joined attributes cannot be used in lookups",
                ));
            }

            let fragment = match &cond.operand {
                Operand::Value(Value::Null) => Fragment::sql(format!("{} IS NULL", target_expr)),
                Operand::Value(value) => {
                    let mut f = Fragment::sql(format!("{} = ", target_expr));
                    f.push_param(value.clone());
                    f
                }
                Operand::Outer(name) => {
                    let (_, outer_expr) = self.shaper.resolve(name)?;
                    Fragment::sql(format!("{} = {}", target_expr, outer_expr))
                }
            };
            conditions.push(fragment);
        }

        let mut fragment = Fragment::sql(format!(
            "EXISTS (SELECT 1 FROM {} AS {} WHERE ",
            quote_identifier(&target.table)?,
            quote_identifier(&alias)?
        ));
        fragment.append(Fragment::all(conditions));
        fragment.push_sql(")");
        Ok(fragment)
    }
}

fn require_scalar(attr: &AttributeMeta, op: Operator, value: &Value) -> PlanResult<()> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(PlanError::invalid_value(
            &attr.name,
            op.as_str(),
            "expected a scalar value",
        )),
        _ => Ok(()),
    }
}

/// Values must fit the attribute's storage type; text and JSON attributes
/// accept any scalar, null is always accepted
fn require_typed(attr: &AttributeMeta, op: Operator, value: &Value) -> PlanResult<()> {
    let valid = match (attr.attribute_type, value) {
        (_, Value::Null) => true,
        (AttributeType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
        (AttributeType::Float, Value::Number(_)) => true,
        (AttributeType::Boolean, Value::Bool(_)) => true,
        (AttributeType::Timestamp, Value::String(s)) => {
            DateTime::parse_from_rfc3339(s).is_ok()
                || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        }
        (AttributeType::Uuid, Value::String(s)) => Uuid::parse_str(s).is_ok(),
        (AttributeType::Text | AttributeType::Json, _) => true,
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(PlanError::invalid_value(
            &attr.name,
            op.as_str(),
            format!("expected a {:?} value", attr.attribute_type).to_lowercase(),
        ))
    }
}

fn compile_membership(
    attr: &AttributeMeta,
    op: Operator,
    expr: &str,
    value: &Value,
) -> PlanResult<Fragment> {
    let items = value
        .as_array()
        .ok_or_else(|| PlanError::invalid_value(&attr.name, op.as_str(), "expected an array"))?;

    // Empty lists never reach SQL: IN () is a syntax error in most engines.
    if items.is_empty() {
        return Ok(match op {
            Operator::In => Fragment::always_false(),
            _ => Fragment::always_true(),
        });
    }

    let keyword = if op == Operator::In { "IN" } else { "NOT IN" };
    let mut fragment = Fragment::sql(format!("{} {} (", expr, keyword));
    for (i, item) in items.iter().enumerate() {
        require_scalar(attr, op, item)?;
        if i > 0 {
            fragment.push_sql(", ");
        }
        fragment.push_param(item.clone());
    }
    fragment.push_sql(")");
    Ok(fragment)
}

fn compile_pattern(
    attr: &AttributeMeta,
    op: Operator,
    expr: &str,
    value: &Value,
) -> PlanResult<Fragment> {
    let text = value
        .as_str()
        .ok_or_else(|| PlanError::invalid_value(&attr.name, op.as_str(), "expected a string"))?;

    let escaped = escape_like(text);
    let pattern = match op {
        Operator::StartsWith | Operator::NotStartsWith => format!("{}%", escaped),
        Operator::EndsWith | Operator::NotEndsWith => format!("%{}", escaped),
        _ => format!("%{}%", escaped),
    };

    let keyword = if op.is_negated_pattern() { "NOT ILIKE" } else { "ILIKE" };
    let mut fragment = Fragment::sql(format!("{} {} ", expr, keyword));
    fragment.push_param(Value::String(pattern));
    fragment.push_sql(" ESCAPE '\\'");
    Ok(fragment)
}
