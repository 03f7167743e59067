//! seekplan - compiles filters, orderings, permission rules and cursors into
//! keyset-paginated SQL plans
//!
//! A request names an entity, a filter tree, an ordering, a set of
//! permission rules and page arguments. [`QueryAssembler`] turns it into a
//! parameterized SELECT with keyset bounds, a COUNT query and existence
//! checks for the neighbouring pages. [`build_page`] shapes fetched rows
//! into edges and page info.

pub mod cli;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod executor;
pub mod filter;
pub mod permission;
pub mod planner;
pub mod schema;
pub mod sql;

pub use config::{PlaceholderStyle, PlannerConfig};
pub use cursor::{CursorCodec, DecodedCursor};
pub use errors::{PlanError, PlanResult};
pub use filter::{parse_filter, FilterCompiler, FilterNode};
pub use permission::{CallerContext, PermissionCompiler, PermissionOutcome, PermissionRule};
pub use planner::{build_page, KeysetPlanner, OrderSpec, Page, PageRequest, PlannedQuery, QueryAssembler};
pub use schema::Catalog;
