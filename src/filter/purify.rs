//! Purification: removal of semantically neutral sub-trees
//!
//! Undefined leaves vanish, and compound children left without children are
//! dropped. The root compound may end up empty; it then compiles to the
//! identity of its junction.
//!
//! A nested empty compound means "no constraint", not its junction's
//! identity: `{"$or": [{"$or": []}, {"id": 1}]}` reduces to `id = 1`, while
//! a bare `{"$or": []}` at the root matches nothing.

use super::ast::FilterNode;

impl FilterNode {
    /// Returns the purified tree, or `None` when nothing of it remains
    pub fn purify(self) -> Option<FilterNode> {
        match self {
            FilterNode::Leaf(cond) => cond.value.is_some().then_some(FilterNode::Leaf(cond)),
            FilterNode::Exists(lookup) => Some(FilterNode::Exists(lookup)),
            FilterNode::Compound { kind, children } => {
                let children = children
                    .into_iter()
                    .filter_map(FilterNode::purify)
                    .filter(|child| !child.is_empty_compound())
                    .collect();
                Some(FilterNode::Compound { kind, children })
            }
        }
    }

    /// True when purifying would not change the tree
    pub fn is_pure(&self) -> bool {
        match self {
            FilterNode::Leaf(cond) => cond.value.is_some(),
            FilterNode::Exists(_) => true,
            FilterNode::Compound { children, .. } => children
                .iter()
                .all(|child| child.is_pure() && !child.is_empty_compound()),
        }
    }

    fn is_empty_compound(&self) -> bool {
        matches!(self, FilterNode::Compound { children, .. } if children.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Operator;
    use serde_json::json;

    #[test]
    fn test_undefined_leaf_removed() {
        let tree = FilterNode::and(vec![
            FilterNode::eq("a", json!(1)),
            FilterNode::undefined("b", Operator::Eq),
        ]);
        assert_eq!(
            tree.purify(),
            Some(FilterNode::and(vec![FilterNode::eq("a", json!(1))]))
        );
    }

    #[test]
    fn test_nested_empty_compounds_removed() {
        let tree = FilterNode::or(vec![
            FilterNode::and(vec![FilterNode::undefined("b", Operator::Eq)]),
            FilterNode::or(vec![]),
            FilterNode::eq("a", json!(1)),
        ]);
        assert_eq!(
            tree.purify(),
            Some(FilterNode::or(vec![FilterNode::eq("a", json!(1))]))
        );
    }

    #[test]
    fn test_root_may_become_empty() {
        let tree = FilterNode::or(vec![FilterNode::undefined("b", Operator::Eq)]);
        assert_eq!(tree.purify(), Some(FilterNode::or(vec![])));
        assert_eq!(FilterNode::undefined("b", Operator::Eq).purify(), None);
    }

    #[test]
    fn test_idempotent() {
        let tree = FilterNode::and(vec![
            FilterNode::or(vec![
                FilterNode::and(vec![]),
                FilterNode::eq("a", json!(1)),
            ]),
            FilterNode::undefined("c", Operator::Gt),
        ]);
        assert!(!tree.is_pure());

        let once = tree.purify().unwrap();
        assert!(once.is_pure());
        assert_eq!(once.clone().purify(), Some(once));
    }
}
