//! Declarative permission rules
//!
//! A rule holds when all of its conditions hold; a rule set holds when any
//! rule does. Each rule either resolves statically against the caller or
//! delegates to a row predicate.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::filter::{FilterNode, Lookup, LookupCondition, Operand};

use super::context::CallerContext;

/// Caller-supplied function producing a lookup value
#[derive(Clone)]
pub struct ContextResolver(Arc<dyn Fn(&CallerContext) -> Option<Value> + Send + Sync>);

impl ContextResolver {
    pub fn new(f: impl Fn(&CallerContext) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn resolve(&self, caller: &CallerContext) -> Option<Value> {
        (self.0)(caller)
    }
}

impl fmt::Debug for ContextResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextResolver(..)")
    }
}

/// Well-known caller values
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallerValue {
    UserId,
    Claim(String),
}

/// Right-hand side of a lookup condition
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LookupValue {
    /// Fixed value
    Literal(Value),
    /// Attribute of the row being filtered
    Source(String),
    /// Value taken from the caller context
    Caller(CallerValue),
    #[serde(skip)]
    Resolver(ContextResolver),
}

/// Existence check against a related entity
#[derive(Debug, Clone, Deserialize)]
pub struct LookupRule {
    pub target: String,
    pub conditions: BTreeMap<String, LookupValue>,
}

/// One permission rule
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionRule {
    /// Caller holds a role
    Role(String),
    /// Row attribute equals the caller's user id
    UserAttribute(String),
    /// A matching row exists in another entity
    Lookup(LookupRule),
}

/// What a single rule amounts to for a given caller
#[derive(Debug, Clone, PartialEq)]
pub enum RuleResolution {
    /// Holds for every row
    Satisfied,
    /// Holds for no row
    Unsatisfiable,
    /// Holds for rows matching the predicate
    Predicate(FilterNode),
}

impl PermissionRule {
    pub fn role(role: impl Into<String>) -> Self {
        PermissionRule::Role(role.into())
    }

    pub fn user_attribute(attribute: impl Into<String>) -> Self {
        PermissionRule::UserAttribute(attribute.into())
    }

    pub fn lookup<I, K>(target: impl Into<String>, conditions: I) -> Self
    where
        I: IntoIterator<Item = (K, LookupValue)>,
        K: Into<String>,
    {
        PermissionRule::Lookup(LookupRule {
            target: target.into(),
            conditions: conditions.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    /// Decides the rule without touching any row, if possible
    pub fn is_statically_satisfied(&self, caller: &CallerContext) -> bool {
        match self {
            PermissionRule::Role(role) => caller.has_role(role),
            PermissionRule::UserAttribute(_) | PermissionRule::Lookup(_) => false,
        }
    }

    pub fn resolve(&self, caller: &CallerContext) -> RuleResolution {
        match self {
            PermissionRule::Role(role) => {
                if caller.has_role(role) {
                    RuleResolution::Satisfied
                } else {
                    RuleResolution::Unsatisfiable
                }
            }
            PermissionRule::UserAttribute(attribute) => match &caller.user_id {
                Some(id) => RuleResolution::Predicate(FilterNode::eq(attribute, id.clone())),
                None => RuleResolution::Unsatisfiable,
            },
            PermissionRule::Lookup(rule) => rule.resolve(caller),
        }
    }
}

impl LookupRule {
    fn resolve(&self, caller: &CallerContext) -> RuleResolution {
        let mut conditions = Vec::with_capacity(self.conditions.len());

        for (attribute, value) in &self.conditions {
            let operand = match value {
                LookupValue::Literal(v) => Operand::Value(v.clone()),
                LookupValue::Source(source) => Operand::Outer(source.clone()),
                LookupValue::Caller(CallerValue::UserId) => match &caller.user_id {
                    Some(id) => Operand::Value(id.clone()),
                    None => return RuleResolution::Unsatisfiable,
                },
                LookupValue::Caller(CallerValue::Claim(name)) => match caller.claims.get(name) {
                    Some(v) => Operand::Value(v.clone()),
                    None => return RuleResolution::Unsatisfiable,
                },
                LookupValue::Resolver(resolver) => match resolver.resolve(caller) {
                    Some(v) => Operand::Value(v),
                    None => return RuleResolution::Unsatisfiable,
                },
            };
            conditions.push(LookupCondition {
                attribute: attribute.clone(),
                operand,
            });
        }

        RuleResolution::Predicate(FilterNode::Exists(Lookup {
            entity: self.target.clone(),
            conditions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_resolution() {
        let rule = PermissionRule::role("admin");
        let admin = CallerContext::authenticated(1).with_role("admin");
        assert!(rule.is_statically_satisfied(&admin));
        assert_eq!(rule.resolve(&admin), RuleResolution::Satisfied);
        assert_eq!(
            rule.resolve(&CallerContext::authenticated(1)),
            RuleResolution::Unsatisfiable
        );
    }

    #[test]
    fn test_user_attribute_needs_user() {
        let rule = PermissionRule::user_attribute("ownerId");
        assert_eq!(
            rule.resolve(&CallerContext::authenticated(7)),
            RuleResolution::Predicate(FilterNode::eq("ownerId", json!(7)))
        );
        assert_eq!(
            rule.resolve(&CallerContext::anonymous()),
            RuleResolution::Unsatisfiable
        );
    }

    #[test]
    fn test_lookup_resolves_context_values() {
        let rule = PermissionRule::lookup(
            "Membership",
            [
                ("boardId", LookupValue::Source("id".into())),
                ("userId", LookupValue::Caller(CallerValue::UserId)),
                (
                    "level",
                    LookupValue::Resolver(ContextResolver::new(|c| c.claims.get("level").cloned())),
                ),
            ],
        );

        let caller = CallerContext::authenticated(3).with_claim("level", 2);
        match rule.resolve(&caller) {
            RuleResolution::Predicate(FilterNode::Exists(lookup)) => {
                assert_eq!(lookup.entity, "Membership");
                assert_eq!(lookup.conditions.len(), 3);
                assert_eq!(lookup.conditions[0].operand, Operand::Outer("id".into()));
                assert_eq!(lookup.conditions[1].operand, Operand::Value(json!(2)));
                assert_eq!(lookup.conditions[2].operand, Operand::Value(json!(3)));
            }
            other => panic!("expected lookup predicate, got {:?}", other),
        }

        assert_eq!(
            rule.resolve(&CallerContext::authenticated(3)),
            RuleResolution::Unsatisfiable
        );
    }

    #[test]
    fn test_deserialize_rules() {
        let rules: Vec<PermissionRule> = serde_json::from_value(json!([
            {"role": "admin"},
            {"userAttribute": "ownerId"},
            {"lookup": {
                "target": "Membership",
                "conditions": {
                    "boardId": {"source": "id"},
                    "userId": {"caller": "userId"},
                    "team": {"caller": {"claim": "team"}},
                    "active": {"literal": true}
                }
            }}
        ]))
        .unwrap();
        assert_eq!(rules.len(), 3);
        assert!(matches!(&rules[0], PermissionRule::Role(r) if r == "admin"));
        match &rules[2] {
            PermissionRule::Lookup(rule) => {
                assert_eq!(rule.conditions.len(), 4);
                assert!(matches!(
                    rule.conditions.get("team"),
                    Some(LookupValue::Caller(CallerValue::Claim(c))) if c == "team"
                ));
            }
            other => panic!("expected lookup, got {:?}", other),
        }
    }
}
