//! Page planning
//!
//! Produces one deterministic plan per page request: the page statement,
//! the count statement and the neighbour checks, plus the context needed to
//! shape the executed rows into a page.
//!
//! # Flow
//!
//! 1. [`OrderSpec`] is normalized (attributes checked, primary key appended)
//! 2. [`KeysetPlanner`] decodes cursors into tuple bounds and picks the scan
//!    direction and window
//! 3. [`QueryAssembler`] ANDs filter, permission and bounds into SQL
//! 4. [`build_page`] trims the over-fetch row and derives page info

mod assembler;
mod explain;
mod keyset;
mod order;
mod page;
mod request;

pub use assembler::{PlannedQuery, NeighbourCheck, QueryAssembler, QueryPlan};
pub use explain::ExplainPlan;
pub use keyset::{KeysetPlan, KeysetPlanner, PageSide, NeighbourBound};
pub use order::{OrderSpec, OrderTerm, SortDirection};
pub use page::{build_page, Edge, Page, PageFetch, PageInfo};
pub use request::{PageRequest, PageWindow, ScanDirection};
