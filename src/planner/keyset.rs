//! Keyset (seek) planning
//!
//! Turns decoded cursors into lexicographic tuple bounds over the active
//! order. For `(a1, a2, a3)` and a cursor `(v1, v2, v3)`, "strictly after"
//! expands to
//!
//! ```text
//! a1 > v1 OR (a1 = v1 AND (a2 > v2 OR (a2 = v2 AND a3 > v3)))
//! ```
//!
//! with `<` in place of `>` for DESC columns. Bounds are expressed against
//! the requested order; only the scan order flips for `last`.
//!
//! NULL sorts below every value (`NULLS FIRST` ascending, `NULLS LAST`
//! descending), so each step gains `IS NULL` / `IS NOT NULL` branches:
//! "below v" admits NULL rows, "above NULL" is `IS NOT NULL`, nothing is
//! below NULL. Attributes registered with [`KeysetPlanner::with_non_null`]
//! skip the NULL branches.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::config::PlannerConfig;
use crate::cursor::{CursorCodec, DecodedCursor};
use crate::errors::{PlanError, PlanResult};
use crate::filter::{FilterNode, Operator};

use super::order::{OrderSpec, SortDirection};
use super::request::{PageRequest, ScanDirection};

/// Which neighbouring page a check looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSide {
    Previous,
    Next,
}

impl PageSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSide::Previous => "previous",
            PageSide::Next => "next",
        }
    }
}

/// Inclusive complement of a cursor bound
#[derive(Debug, Clone, PartialEq)]
pub struct NeighbourBound {
    pub side: PageSide,
    pub bound: FilterNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeysetPlan {
    /// `after` and `before` bounds, AND-combined (`TRUE` when absent)
    pub bounds: FilterNode,
    /// Order rows are scanned in
    pub scan_order: OrderSpec,
    pub direction: ScanDirection,
    pub limit: u64,
    pub offset: u64,
    pub neighbours: Vec<NeighbourBound>,
}

impl KeysetPlan {
    /// Rows requested from the store: one more than the page holds
    pub fn fetch_limit(&self) -> u64 {
        self.limit.saturating_add(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Towards {
    After,
    Before,
}

pub struct KeysetPlanner<'a> {
    config: &'a PlannerConfig,
    non_null: BTreeSet<String>,
}

impl<'a> KeysetPlanner<'a> {
    pub fn new(config: &'a PlannerConfig) -> Self {
        Self {
            config,
            non_null: BTreeSet::new(),
        }
    }

    /// Declares an attribute that never holds NULL (e.g. the primary key)
    pub fn with_non_null(mut self, attribute: impl Into<String>) -> Self {
        self.non_null.insert(attribute.into());
        self
    }

    /// Plans bounds and window for a normalized order
    pub fn plan(&self, order: &OrderSpec, page: &PageRequest, scope: &str) -> PlanResult<KeysetPlan> {
        let window = page.window(self.config)?;

        let after = page
            .after
            .as_deref()
            .map(|c| decode_for(c, scope, order))
            .transpose()?;
        let before = page
            .before
            .as_deref()
            .map(|c| decode_for(c, scope, order))
            .transpose()?;

        let mut bounds = Vec::new();
        let mut neighbours = Vec::new();

        if let Some(cursor) = &after {
            bounds.push(self.seek(order, &cursor.tuple, Towards::After, false));
            neighbours.push(NeighbourBound {
                side: PageSide::Previous,
                bound: self.seek(order, &cursor.tuple, Towards::Before, true),
            });
        }
        if let Some(cursor) = &before {
            bounds.push(self.seek(order, &cursor.tuple, Towards::Before, false));
            neighbours.push(NeighbourBound {
                side: PageSide::Next,
                bound: self.seek(order, &cursor.tuple, Towards::After, true),
            });
        }

        let scan_order = match window.direction {
            ScanDirection::Forward => order.clone(),
            ScanDirection::Backward => order.reversed(),
        };

        Ok(KeysetPlan {
            bounds: FilterNode::and(bounds),
            scan_order,
            direction: window.direction,
            limit: window.limit,
            offset: window.offset,
            neighbours,
        })
    }

    /// Lexicographic bound; `inclusive` admits the cursor row itself
    fn seek(
        &self,
        order: &OrderSpec,
        tuple: &[(String, Value)],
        towards: Towards,
        inclusive: bool,
    ) -> FilterNode {
        let last = order.len().saturating_sub(1);
        let mut bound = Bound::Never;

        for (i, (term, (_, value))) in order.terms().iter().zip(tuple).enumerate().rev() {
            let direction = match towards {
                Towards::After => term.direction,
                Towards::Before => term.direction.reversed(),
            };
            let nullable = !self.non_null.contains(&term.attribute);
            let attr = term.attribute.as_str();

            bound = if i == last {
                beyond(attr, value, direction, inclusive, nullable)
            } else {
                beyond(attr, value, direction, false, nullable)
                    .or(Bound::then(at(attr, value), bound))
            };
        }

        match order.terms().first() {
            Some(first) => bound.into_node(&first.attribute),
            None => FilterNode::and(vec![]),
        }
    }
}

/// Rows admitted by a bound; the constant cases are kept out of the
/// filter tree so purification cannot drop them
#[derive(Debug)]
enum Bound {
    Never,
    Always,
    Any(Vec<FilterNode>),
}

impl Bound {
    fn or(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::Always, _) | (_, Bound::Always) => Bound::Always,
            (Bound::Never, b) | (b, Bound::Never) => b,
            (Bound::Any(mut a), Bound::Any(b)) => {
                a.extend(b);
                Bound::Any(a)
            }
        }
    }

    /// `head AND rest`
    fn then(head: FilterNode, rest: Bound) -> Bound {
        match rest {
            Bound::Never => Bound::Never,
            Bound::Always => Bound::Any(vec![head]),
            Bound::Any(alternatives) => {
                Bound::Any(vec![FilterNode::and(vec![head, either(alternatives)])])
            }
        }
    }

    fn into_node(self, attribute: &str) -> FilterNode {
        match self {
            // empty `$in` compiles to FALSE
            Bound::Never => FilterNode::leaf(attribute, Operator::In, Value::Array(Vec::new())),
            Bound::Always => FilterNode::and(vec![]),
            Bound::Any(alternatives) => either(alternatives),
        }
    }
}

fn either(mut alternatives: Vec<FilterNode>) -> FilterNode {
    if alternatives.len() == 1 {
        alternatives.remove(0)
    } else {
        FilterNode::or(alternatives)
    }
}

fn is_null(attribute: &str, null: bool) -> FilterNode {
    FilterNode::leaf(attribute, Operator::IsNull, Value::Bool(null))
}

/// `attribute = value`, or `IS NULL` for a NULL cursor value
fn at(attribute: &str, value: &Value) -> FilterNode {
    if value.is_null() {
        is_null(attribute, true)
    } else {
        FilterNode::eq(attribute, value.clone())
    }
}

/// Rows past `value` when walking `direction` (NULL lowest)
fn beyond(
    attribute: &str,
    value: &Value,
    direction: SortDirection,
    inclusive: bool,
    nullable: bool,
) -> Bound {
    match (direction, value.is_null()) {
        (SortDirection::Asc, true) if inclusive => Bound::Always,
        (SortDirection::Asc, true) => Bound::Any(vec![is_null(attribute, false)]),
        (SortDirection::Desc, true) if inclusive => Bound::Any(vec![is_null(attribute, true)]),
        (SortDirection::Desc, true) => Bound::Never,
        (SortDirection::Asc, false) => {
            let op = if inclusive { Operator::Gte } else { Operator::Gt };
            Bound::Any(vec![FilterNode::leaf(attribute, op, value.clone())])
        }
        (SortDirection::Desc, false) => {
            let op = if inclusive { Operator::Lte } else { Operator::Lt };
            let mut alternatives = vec![FilterNode::leaf(attribute, op, value.clone())];
            if nullable {
                alternatives.push(is_null(attribute, true));
            }
            Bound::Any(alternatives)
        }
    }
}

/// Decodes a cursor and checks it matches the active order column by column
fn decode_for(cursor: &str, scope: &str, order: &OrderSpec) -> PlanResult<DecodedCursor> {
    let decoded = CursorCodec::decode_scoped(cursor, scope)?;
    if decoded.tuple.len() != order.len() {
        return Err(PlanError::malformed_cursor(format!(
            "cursor has {} columns, ordering has {}",
            decoded.tuple.len(),
            order.len()
        )));
    }
    for (term, attribute) in order.terms().iter().zip(decoded.attributes()) {
        if term.attribute != attribute {
            return Err(PlanError::malformed_cursor(format!(
                "cursor column '{}' does not match ordering column '{}'",
                attribute, term.attribute
            )));
        }
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::order::OrderTerm;
    use serde_json::json;

    fn order() -> OrderSpec {
        OrderSpec::new(vec![OrderTerm::asc("username"), OrderTerm::asc("id")])
    }

    fn cursor(scope: &str) -> String {
        CursorCodec::encode(
            scope,
            &[
                ("username".to_string(), json!("amalia943")),
                ("id".to_string(), json!(65)),
            ],
        )
    }

    #[test]
    fn test_after_bound_nested_expansion() {
        let config = PlannerConfig::default();
        let plan = KeysetPlanner::new(&config)
            .plan(&order(), &PageRequest::first(10).after(cursor("User")), "User")
            .unwrap();
        assert_eq!(
            plan.bounds.to_string(),
            "((username $gt \"amalia943\" OR (username $eq \"amalia943\" AND id $gt 65)))"
        );
        assert_eq!(plan.direction, ScanDirection::Forward);
        assert_eq!(plan.fetch_limit(), 11);
    }

    #[test]
    fn test_desc_columns_use_less_than() {
        let config = PlannerConfig::default();
        let order = OrderSpec::new(vec![OrderTerm::desc("registeredAt"), OrderTerm::asc("id")]);
        let c = CursorCodec::encode(
            "User",
            &[
                ("registeredAt".to_string(), json!("2020-01-01")),
                ("id".to_string(), json!(3)),
            ],
        );
        let plan = KeysetPlanner::new(&config)
            .plan(&order, &PageRequest::first(5).after(c), "User")
            .unwrap();
        assert_eq!(
            plan.bounds.to_string(),
            "((registeredAt $lt \"2020-01-01\" OR registeredAt $isNull true \
             OR (registeredAt $eq \"2020-01-01\" AND id $gt 3)))"
        );
    }

    #[test]
    fn test_last_reverses_scan_not_bounds() {
        let config = PlannerConfig::default();
        let plan = KeysetPlanner::new(&config)
            .with_non_null("id")
            .plan(&order(), &PageRequest::last(2).before(cursor("User")), "User")
            .unwrap();
        assert_eq!(plan.direction, ScanDirection::Backward);
        assert_eq!(plan.scan_order.to_string(), "username DESC, id DESC");
        assert_eq!(
            plan.bounds.to_string(),
            "((username $lt \"amalia943\" OR username $isNull true \
             OR (username $eq \"amalia943\" AND id $lt 65)))"
        );
    }

    #[test]
    fn test_neighbour_checks_are_inclusive_complements() {
        let config = PlannerConfig::default();
        let request = PageRequest::first(2).after(cursor("User")).before(cursor("User"));
        let plan = KeysetPlanner::new(&config)
            .with_non_null("id")
            .plan(&order(), &request, "User")
            .unwrap();
        assert_eq!(plan.neighbours.len(), 2);
        assert_eq!(plan.neighbours[0].side, PageSide::Previous);
        assert_eq!(
            plan.neighbours[0].bound.to_string(),
            "(username $lt \"amalia943\" OR username $isNull true \
             OR (username $eq \"amalia943\" AND id $lte 65))"
        );
        assert_eq!(plan.neighbours[1].side, PageSide::Next);
        assert_eq!(
            plan.neighbours[1].bound.to_string(),
            "(username $gt \"amalia943\" OR (username $eq \"amalia943\" AND id $gte 65))"
        );
    }

    #[test]
    fn test_null_cursor_values() {
        let config = PlannerConfig::default();
        let planner = KeysetPlanner::new(&config).with_non_null("id");
        let null_at = |id: i64| {
            CursorCodec::encode(
                "User",
                &[
                    ("registeredAt".to_string(), Value::Null),
                    ("id".to_string(), json!(id)),
                ],
            )
        };

        let asc = OrderSpec::new(vec![OrderTerm::asc("registeredAt"), OrderTerm::asc("id")]);
        let plan = planner
            .plan(&asc, &PageRequest::first(2).after(null_at(4)), "User")
            .unwrap();
        assert_eq!(
            plan.bounds.to_string(),
            "((registeredAt $isNull false OR (registeredAt $isNull true AND id $gt 4)))"
        );
        assert_eq!(
            plan.neighbours[0].bound.to_string(),
            "(registeredAt $isNull true AND id $lte 4)"
        );

        let desc = OrderSpec::new(vec![OrderTerm::desc("registeredAt"), OrderTerm::asc("id")]);
        let plan = planner
            .plan(&desc, &PageRequest::first(2).after(null_at(2)), "User")
            .unwrap();
        assert_eq!(
            plan.bounds.to_string(),
            "((registeredAt $isNull true AND id $gt 2))"
        );
        assert_eq!(
            plan.neighbours[0].bound.to_string(),
            "(registeredAt $isNull false OR (registeredAt $isNull true AND id $lte 2))"
        );
    }

    #[test]
    fn test_nothing_below_null() {
        let config = PlannerConfig::default();
        let order = OrderSpec::new(vec![OrderTerm::desc("score")]);
        let c = CursorCodec::encode("Game", &[("score".to_string(), Value::Null)]);
        let plan = KeysetPlanner::new(&config)
            .plan(&order, &PageRequest::first(2).after(c), "Game")
            .unwrap();
        assert_eq!(plan.bounds.to_string(), "(score $in [])");
    }

    #[test]
    fn test_no_cursor_no_bounds() {
        let config = PlannerConfig::default();
        let plan = KeysetPlanner::new(&config)
            .plan(&order(), &PageRequest::default(), "User")
            .unwrap();
        assert_eq!(plan.bounds, FilterNode::and(vec![]));
        assert!(plan.neighbours.is_empty());
        assert_eq!(plan.limit, 100);
    }

    #[test]
    fn test_cursor_must_fit_order() {
        let config = PlannerConfig::default();
        let planner = KeysetPlanner::new(&config);

        let short = CursorCodec::encode("User", &[("username".to_string(), json!("a"))]);
        let err = planner
            .plan(&order(), &PageRequest::first(1).after(short), "User")
            .unwrap_err();
        assert_eq!(err.code(), "SEEK_MALFORMED_CURSOR");

        let swapped = CursorCodec::encode(
            "User",
            &[("id".to_string(), json!(1)), ("username".to_string(), json!("a"))],
        );
        let err = planner
            .plan(&order(), &PageRequest::first(1).before(swapped), "User")
            .unwrap_err();
        assert_eq!(err.code(), "SEEK_MALFORMED_CURSOR");
    }

    #[test]
    fn test_cursor_from_other_scope_rejected() {
        let config = PlannerConfig::default();
        let err = KeysetPlanner::new(&config)
            .plan(&order(), &PageRequest::first(1).after(cursor("Board.members")), "User")
            .unwrap_err();
        assert_eq!(err.code(), "SEEK_MALFORMED_CURSOR");
    }
}
