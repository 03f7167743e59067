//! Permission compiler
//!
//! Reduces a rule set to one of three outcomes for a caller. Role rules are
//! decided up front, so a satisfied role wins regardless of where it sits in
//! the list. Remaining rules become row predicates, OR-combined.

use tracing::debug;

use crate::filter::FilterNode;
use crate::schema::EntitySpec;

use super::context::CallerContext;
use super::rules::{PermissionRule, RuleResolution};

/// Result of compiling a rule set
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionOutcome {
    /// Every row is visible
    AllowAll,
    /// Rows matching the predicate are visible
    Filter(FilterNode),
    /// No row is visible
    Deny,
}

impl PermissionOutcome {
    pub fn is_denied(&self) -> bool {
        matches!(self, PermissionOutcome::Deny)
    }

    /// Predicate to AND into the WHERE clause, if any
    pub fn predicate(&self) -> Option<&FilterNode> {
        match self {
            PermissionOutcome::Filter(node) => Some(node),
            _ => None,
        }
    }
}

pub struct PermissionCompiler;

impl PermissionCompiler {
    /// True when the rule set is satisfied without looking at rows
    pub fn statically_allows(rules: &[PermissionRule], caller: &CallerContext) -> bool {
        rules.is_empty()
            || caller.can_bypass_permissions()
            || rules.iter().any(|rule| rule.is_statically_satisfied(caller))
    }

    pub fn compile(
        rules: &[PermissionRule],
        caller: &CallerContext,
        entity: &EntitySpec,
    ) -> PermissionOutcome {
        if Self::statically_allows(rules, caller) {
            debug!(entity = %entity.name, "permissions statically satisfied");
            return PermissionOutcome::AllowAll;
        }

        let mut predicates = Vec::new();
        for rule in rules {
            match rule.resolve(caller) {
                RuleResolution::Satisfied => return PermissionOutcome::AllowAll,
                RuleResolution::Unsatisfiable => {}
                RuleResolution::Predicate(node) => predicates.push(node),
            }
        }

        let outcome = match predicates.len() {
            0 => PermissionOutcome::Deny,
            1 => PermissionOutcome::Filter(predicates.remove(0)),
            _ => PermissionOutcome::Filter(FilterNode::or(predicates)),
        };
        debug!(entity = %entity.name, outcome = ?outcome, "compiled permissions");
        outcome
    }
}
