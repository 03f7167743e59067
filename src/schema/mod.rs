//! Entity metadata consumed by the planner
//!
//! Attribute metadata maps logical names to storage columns, JSON pointer
//! paths and operator capabilities. It is owned by the entity layer and
//! treated as read-only here.

mod errors;
mod loader;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use loader::Catalog;
pub use types::{AttributeMeta, AttributeType, ColumnSource, EntitySpec, JoinSpec};
