//! In-memory execution of planned queries
//!
//! Stands in for the SQL engine: evaluates the structured predicates of a
//! [`PlannedQuery`](crate::planner::PlannedQuery) with SQL semantics against
//! stored JSON rows.
//!
//! # Execution Flow (strict order)
//!
//! 1. Project stored rows to attribute names
//! 2. Count rows matching filter and permissions
//! 3. Filter rows by the page predicate (bounds included)
//! 4. Sort by the scan order
//! 5. Apply offset and the over-fetch limit
//! 6. Run neighbour checks

mod database;
mod errors;
mod filters;
mod sorter;

pub use database::MemoryDatabase;
pub use errors::{ExecutorError, ExecutorResult};
pub use filters::{RowFilter, Truth};
pub use sorter::{compare_sql, compare_values, ResultSorter};
