//! Filter expressions and their compilation to SQL
//!
//! # Pipeline
//!
//! 1. `parse_filter` turns the wire JSON form into a [`FilterNode`] tree
//! 2. `FilterNode::purify` drops undefined leaves and empty compounds
//! 3. [`FilterCompiler`] resolves attributes, checks operator capabilities
//!    and emits a parameterized fragment

mod ast;
mod compiler;
mod parser;
mod purify;

pub use ast::{Condition, FilterNode, Junction, Lookup, LookupCondition, Operand, Operator};
pub use compiler::FilterCompiler;
pub use parser::parse_filter;
