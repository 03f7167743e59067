//! Page shaping
//!
//! Post-processes the rows of an executed page query: drops the over-fetch
//! row, restores the requested order after a backward scan, attaches cursors
//! and derives the page info flags.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::cursor::CursorCodec;

use super::assembler::PlannedQuery;
use super::request::ScanDirection;

/// Raw results of executing a [`PlannedQuery`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFetch {
    /// Page rows in scan order, keyed by attribute name
    pub rows: Vec<Map<String, Value>>,
    /// Result of the count statement
    pub total_count: u64,
    /// The `previous` neighbour check found a row
    pub preceding: bool,
    /// The `next` neighbour check found a row
    pub following: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub cursor: String,
    pub node: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
    pub total_count: u64,
    pub result_count: u64,
}

impl Page {
    pub fn nodes(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.edges.iter().map(|e| &e.node)
    }
}

pub fn build_page(planned: &PlannedQuery, fetch: PageFetch) -> Page {
    let mut rows = fetch.rows;
    let limit = usize::try_from(planned.limit).unwrap_or(usize::MAX);
    let overflow = rows.len() > limit;
    rows.truncate(limit);
    if planned.direction == ScanDirection::Backward {
        rows.reverse();
    }

    // Rows skipped by a positive offset lie before the page in scan order.
    let skipped = planned.offset > 0 && !rows.is_empty();
    let (has_previous_page, has_next_page) = match planned.direction {
        ScanDirection::Forward => (fetch.preceding || skipped, overflow || fetch.following),
        ScanDirection::Backward => (overflow || fetch.preceding, fetch.following || skipped),
    };

    let edges: Vec<Edge> = rows
        .into_iter()
        .map(|node| Edge {
            cursor: CursorCodec::encode(&planned.scope, &planned.order.tuple_of(&node)),
            node,
        })
        .collect();

    Page {
        page_info: PageInfo {
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
            has_next_page,
            has_previous_page,
        },
        total_count: fetch.total_count,
        result_count: edges.len() as u64,
        edges,
    }
}
