//! In-memory row store
//!
//! Rows are stored per entity as JSON objects keyed by storage column;
//! values of joined references are stored under `"alias.column"`. Reads
//! project them to attribute names the same way the planner's SELECT list
//! does, so executed rows look like rows returned by a real store.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::planner::{build_page, Page, PageFetch, PageSide, PlannedQuery};
use crate::schema::{AttributeMeta, Catalog, ColumnSource, EntitySpec};

use super::errors::{ExecutorError, ExecutorResult};
use super::filters::RowFilter;
use super::sorter::ResultSorter;

#[derive(Debug)]
pub struct MemoryDatabase<'a> {
    catalog: &'a Catalog,
    tables: BTreeMap<String, Vec<Map<String, Value>>>,
}

impl<'a> MemoryDatabase<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            tables: BTreeMap::new(),
        }
    }

    /// Loads `{"Entity": [row, ...], ...}` from a JSON file
    pub fn load(catalog: &'a Catalog, path: &Path) -> ExecutorResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ExecutorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tables: BTreeMap<String, Vec<Value>> =
            serde_json::from_str(&raw).map_err(|source| ExecutorError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let mut db = Self::new(catalog);
        for (entity, rows) in tables {
            db.insert_all(&entity, rows)?;
        }
        Ok(db)
    }

    pub fn insert(&mut self, entity: &str, row: Value) -> ExecutorResult<()> {
        let spec = self.catalog.entity(entity)?;
        let row = match row {
            Value::Object(row) => row,
            _ => return Err(ExecutorError::invalid_row(entity, "expected an object")),
        };
        self.tables.entry(spec.name.clone()).or_default().push(row);
        Ok(())
    }

    pub fn insert_all(
        &mut self,
        entity: &str,
        rows: impl IntoIterator<Item = Value>,
    ) -> ExecutorResult<()> {
        for row in rows {
            self.insert(entity, row)?;
        }
        Ok(())
    }

    /// Rows of an entity projected to attribute names
    pub fn rows(&self, entity: &str, locale: &str) -> ExecutorResult<Vec<Map<String, Value>>> {
        let spec = self.catalog.entity(entity)?;
        Ok(self
            .tables
            .get(&spec.name)
            .map(|rows| rows.iter().map(|row| project(spec, row, locale)).collect())
            .unwrap_or_default())
    }

    /// Runs the page statement, the count statement and the neighbour checks
    pub fn execute(&self, planned: &PlannedQuery) -> ExecutorResult<PageFetch> {
        let rows = self.rows(&planned.entity, &planned.locale)?;
        let filter = RowFilter::new(self, &planned.locale);

        let mut matching = Vec::new();
        let mut total_count = 0u64;
        for row in &rows {
            if filter.matches(&planned.count_plan.predicate, row)? {
                total_count += 1;
            }
            if filter.matches(&planned.plan.predicate, row)? {
                matching.push(row.clone());
            }
        }

        ResultSorter::sort(&mut matching, &planned.scan_order);
        let offset = usize::try_from(planned.plan.offset).unwrap_or(usize::MAX);
        let limit = planned
            .plan
            .limit
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(usize::MAX);
        let page_rows: Vec<_> = matching.into_iter().skip(offset).take(limit).collect();

        let mut preceding = false;
        let mut following = false;
        for neighbour in &planned.neighbours {
            let mut found = false;
            for row in &rows {
                if filter.matches(&neighbour.plan.predicate, row)? {
                    found = true;
                    break;
                }
            }
            match neighbour.side {
                PageSide::Previous => preceding |= found,
                PageSide::Next => following |= found,
            }
        }

        debug!(
            entity = %planned.entity,
            fetched = page_rows.len(),
            total_count,
            preceding,
            following,
            "executed page in memory"
        );

        Ok(PageFetch {
            rows: page_rows,
            total_count,
            preceding,
            following,
        })
    }

    /// Executes and shapes the page in one step
    pub fn run(&self, planned: &PlannedQuery) -> ExecutorResult<Page> {
        Ok(build_page(planned, self.execute(planned)?))
    }
}

fn project(entity: &EntitySpec, stored: &Map<String, Value>, locale: &str) -> Map<String, Value> {
    entity
        .attributes
        .iter()
        .map(|attr| (attr.name.clone(), read_attribute(attr, stored, locale)))
        .collect()
}

fn read_attribute(attr: &AttributeMeta, stored: &Map<String, Value>, locale: &str) -> Value {
    let key = match &attr.source {
        ColumnSource::Own => attr.column.clone(),
        ColumnSource::Joined { alias } => format!("{}.{}", alias, attr.column),
    };
    let base = stored.get(&key).unwrap_or(&Value::Null);

    let mut path: Vec<&str> = attr.json_path.iter().map(String::as_str).collect();
    if attr.i18n {
        path.push(locale);
    }
    if path.is_empty() {
        return base.clone();
    }

    let mut current = base;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    // `->>` yields text
    match current {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}
