//! SQL building blocks: parameterized fragments and attribute naming

mod fragment;
mod naming;

pub use fragment::{Fragment, RenderedSql};
pub use naming::{escape_like, is_valid_identifier, json_pointer, qualified, quote_identifier, Shaper};
