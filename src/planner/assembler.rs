//! Query assembly
//!
//! Combines the compiled caller filter, the permission predicate and the
//! keyset bounds into one page statement, a count statement (filter and
//! permissions only) and optional neighbour checks.
//!
//! # Statement shape
//!
//! ```text
//! SELECT <attr expr> AS "<name>", ...
//! FROM "<table>" AS "<table>" [LEFT JOIN ...]
//! WHERE (<filter>) AND (<permission>) AND (<bounds>)
//! ORDER BY <scan order>
//! LIMIT <limit + 1> [OFFSET <offset>]
//! ```

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::errors::{PlanError, PlanResult};
use crate::filter::{FilterCompiler, FilterNode};
use crate::permission::{CallerContext, PermissionCompiler, PermissionOutcome, PermissionRule};
use crate::schema::{Catalog, EntitySpec};
use crate::sql::{qualified, quote_identifier, Fragment, Shaper};

use super::keyset::{KeysetPlanner, PageSide};
use super::order::OrderSpec;
use super::request::{PageRequest, ScanDirection};

/// One executable statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPlan {
    pub sql: String,
    pub params: Vec<Value>,
    pub where_sql: String,
    pub order_by_sql: Option<String>,
    pub limit: Option<u64>,
    pub offset: u64,
    pub scan_direction: ScanDirection,
    /// Structured form of the WHERE clause
    #[serde(skip)]
    pub predicate: FilterNode,
}

/// Existence check answering one side of the page info
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighbourCheck {
    pub side: PageSide,
    pub plan: QueryPlan,
}

/// Everything needed to run a page request and shape its result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedQuery {
    pub entity: String,
    /// Cursor namespace of this connection
    pub scope: String,
    pub locale: String,
    pub plan: QueryPlan,
    pub count_plan: QueryPlan,
    pub neighbours: Vec<NeighbourCheck>,
    /// Requested order including the tie-break column
    pub order: OrderSpec,
    /// Order rows are scanned in
    pub scan_order: OrderSpec,
    pub limit: u64,
    pub offset: u64,
    pub direction: ScanDirection,
}

/// A compiled WHERE member and the tree it came from
struct Clause {
    node: FilterNode,
    fragment: Fragment,
}

pub struct QueryAssembler<'a> {
    catalog: &'a Catalog,
    config: &'a PlannerConfig,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a PlannerConfig) -> Self {
        Self { catalog, config }
    }

    pub fn assemble(
        &self,
        entity_name: &str,
        filter: &FilterNode,
        order: &OrderSpec,
        rules: &[PermissionRule],
        page: &PageRequest,
        caller: &CallerContext,
    ) -> PlanResult<PlannedQuery> {
        let entity = self.catalog.entity(entity_name)?;
        for attribute in filter.attributes() {
            entity.attribute(attribute)?;
        }

        let order = order.normalized(entity)?;
        let scope = page.scope_for(&entity.name).to_string();
        let keyset = KeysetPlanner::new(self.config)
            .with_non_null(entity.primary_key.clone())
            .plan(&order, page, &scope)?;

        let permission = PermissionCompiler::compile(rules, caller, entity);
        if permission.is_denied() {
            warn!(entity = %entity.name, "no permission rule holds for caller");
            return Err(PlanError::AccessDenied(entity.name.clone()));
        }

        let locale = caller
            .locale
            .as_deref()
            .unwrap_or(&self.config.default_locale);
        let alias = entity.table.as_str();
        let shaper = Shaper::new(entity, alias, locale);

        let mut compiler = FilterCompiler::new(self.catalog, shaper);
        let user = Clause {
            node: purified(filter),
            fragment: compiler.compile(filter)?,
        };

        let mut trusted = FilterCompiler::new(self.catalog, shaper)
            .trusted()
            .with_lookup_offset(compiler.lookups_emitted());
        let mut compile_trusted = |node: &FilterNode| -> PlanResult<Clause> {
            Ok(Clause {
                node: purified(node),
                fragment: trusted.compile(node)?,
            })
        };

        let permission = match &permission {
            PermissionOutcome::Filter(node) => Some(compile_trusted(node)?),
            _ => None,
        };
        let bounds = compile_trusted(&keyset.bounds)?;
        let neighbour_bounds = keyset
            .neighbours
            .iter()
            .map(|p| Ok((p.side, compile_trusted(&p.bound)?)))
            .collect::<PlanResult<Vec<_>>>()?;

        let from = from_clause(entity, alias)?;
        let projection = projection(entity, &shaper)?;
        let order_by_sql = keyset.scan_order.to_sql(&shaper)?;

        let base: Vec<&Clause> = std::iter::once(&user).chain(permission.as_ref()).collect();

        let mut page_clauses = base.clone();
        page_clauses.push(&bounds);
        let (predicate, where_fragment) = combine(&page_clauses);
        let mut statement = Fragment::sql(format!("SELECT {} FROM {} WHERE ", projection, from));
        statement.append(where_fragment.clone());
        statement.push_sql(&format!(
            " ORDER BY {} LIMIT {}",
            order_by_sql,
            keyset.fetch_limit()
        ));
        if keyset.offset > 0 {
            statement.push_sql(&format!(" OFFSET {}", keyset.offset));
        }
        let plan = self.finish(
            statement,
            where_fragment,
            predicate,
            Some(order_by_sql),
            Some(keyset.fetch_limit()),
            keyset.offset,
            keyset.direction,
        );

        let (count_predicate, count_where) = combine(&base);
        let mut statement = Fragment::sql(format!("SELECT COUNT(*) AS \"count\" FROM {} WHERE ", from));
        statement.append(count_where.clone());
        let count_plan = self.finish(
            statement,
            count_where,
            count_predicate,
            None,
            None,
            0,
            ScanDirection::Forward,
        );

        let neighbours = neighbour_bounds
            .iter()
            .map(|(side, bound)| {
                let mut clauses = base.clone();
                clauses.push(bound);
                let (predicate, where_fragment) = combine(&clauses);
                let mut statement = Fragment::sql(format!("SELECT 1 FROM {} WHERE ", from));
                statement.append(where_fragment.clone());
                statement.push_sql(" LIMIT 1");
                NeighbourCheck {
                    side: *side,
                    plan: self.finish(
                        statement,
                        where_fragment,
                        predicate,
                        None,
                        Some(1),
                        0,
                        ScanDirection::Forward,
                    ),
                }
            })
            .collect();

        info!(
            entity = %entity.name,
            scope = %scope,
            direction = keyset.direction.as_str(),
            limit = keyset.limit,
            offset = keyset.offset,
            params = plan.params.len(),
            "planned page query"
        );

        Ok(PlannedQuery {
            entity: entity.name.clone(),
            scope,
            locale: locale.to_string(),
            plan,
            count_plan,
            neighbours,
            order,
            scan_order: keyset.scan_order,
            limit: keyset.limit,
            offset: keyset.offset,
            direction: keyset.direction,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        statement: Fragment,
        where_fragment: Fragment,
        predicate: FilterNode,
        order_by_sql: Option<String>,
        limit: Option<u64>,
        offset: u64,
        scan_direction: ScanDirection,
    ) -> QueryPlan {
        let rendered = statement.render(self.config.placeholder);
        QueryPlan {
            sql: rendered.sql,
            params: rendered.params,
            where_sql: where_fragment.render(self.config.placeholder).sql,
            order_by_sql,
            limit,
            offset,
            scan_direction,
            predicate,
        }
    }
}

fn purified(node: &FilterNode) -> FilterNode {
    node.clone()
        .purify()
        .unwrap_or_else(|| FilterNode::and(vec![]))
}

/// ANDs the non-trivial clauses; an empty list yields `TRUE`
fn combine(clauses: &[&Clause]) -> (FilterNode, Fragment) {
    let live: Vec<&&Clause> = clauses
        .iter()
        .filter(|c| c.fragment != Fragment::always_true())
        .collect();

    let predicate = match live.as_slice() {
        [single] => single.node.clone(),
        _ => FilterNode::and(live.iter().map(|c| c.node.clone()).collect()),
    };
    let fragment = Fragment::all(live.iter().map(|c| c.fragment.clone()).collect());
    (predicate, fragment)
}

fn from_clause(entity: &EntitySpec, alias: &str) -> PlanResult<String> {
    let mut from = format!(
        "{} AS {}",
        quote_identifier(&entity.table)?,
        quote_identifier(alias)?
    );
    for join in &entity.joins {
        from.push_str(&format!(
            " LEFT JOIN {} AS {} ON {} = {}",
            quote_identifier(&join.table)?,
            quote_identifier(&join.alias)?,
            qualified(&join.alias, &join.foreign_column)?,
            qualified(alias, &join.local_column)?
        ));
    }
    Ok(from)
}

fn projection(entity: &EntitySpec, shaper: &Shaper<'_>) -> PlanResult<String> {
    let columns = entity
        .attributes
        .iter()
        .map(|attr| {
            Ok(format!(
                "{} AS {}",
                shaper.expression(attr)?,
                quote_identifier(&attr.name)?
            ))
        })
        .collect::<PlanResult<Vec<_>>>()?;
    Ok(columns.join(", "))
}
