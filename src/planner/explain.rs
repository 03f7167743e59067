//! Explain output
//!
//! Produces deterministic, human-readable summaries of accepted and rejected
//! page plans.

use std::fmt;

use serde::Serialize;

use crate::errors::PlanError;

use super::assembler::PlannedQuery;

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    pub entity: Option<String>,
    pub scope: Option<String>,
    /// Structured WHERE of the page statement
    pub predicate: Option<String>,
    pub order: Option<String>,
    pub scan_direction: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub sql: Option<String>,
    pub count_sql: Option<String>,
    /// `side: sql` per neighbour check
    pub neighbours: Vec<String>,
    pub rejection_reason: Option<String>,
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    pub fn from_planned(planned: &PlannedQuery) -> Self {
        Self {
            accepted: true,
            entity: Some(planned.entity.clone()),
            scope: Some(planned.scope.clone()),
            predicate: Some(planned.plan.predicate.to_string()),
            order: Some(planned.order.to_string()),
            scan_direction: Some(planned.direction.as_str().to_string()),
            limit: Some(planned.limit),
            offset: Some(planned.offset),
            sql: Some(planned.plan.sql.clone()),
            count_sql: Some(planned.count_plan.sql.clone()),
            neighbours: planned
                .neighbours
                .iter()
                .map(|p| format!("{}: {}", p.side.as_str(), p.plan.sql))
                .collect(),
            rejection_reason: None,
            rejection_code: None,
        }
    }

    pub fn from_error(err: &PlanError) -> Self {
        Self {
            accepted: false,
            entity: None,
            scope: None,
            predicate: None,
            order: None,
            scan_direction: None,
            limit: None,
            offset: None,
            sql: None,
            count_sql: None,
            neighbours: Vec::new(),
            rejection_reason: Some(err.to_string()),
            rejection_code: Some(err.code().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            if let Some(entity) = &self.entity {
                writeln!(f, "Entity: {}", entity)?;
            }
            if let Some(scope) = &self.scope {
                writeln!(f, "Cursor Scope: {}", scope)?;
            }
            if let Some(predicate) = &self.predicate {
                writeln!(f, "Predicate: {}", predicate)?;
            }
            if let Some(order) = &self.order {
                writeln!(f, "Order: {}", order)?;
            }
            if let Some(direction) = &self.scan_direction {
                writeln!(f, "Scan: {}", direction)?;
            }
            if let Some(limit) = self.limit {
                writeln!(f, "Limit: {} (+1 over-fetch)", limit)?;
            }
            if let Some(offset) = self.offset {
                writeln!(f, "Offset: {}", offset)?;
            }
            if let Some(sql) = &self.sql {
                writeln!(f, "SQL: {}", sql)?;
            }
            if let Some(sql) = &self.count_sql {
                writeln!(f, "Count SQL: {}", sql)?;
            }
            if !self.neighbours.is_empty() {
                writeln!(f, "Neighbour checks:")?;
                for neighbour in &self.neighbours {
                    writeln!(f, "  - {}", neighbour)?;
                }
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}
