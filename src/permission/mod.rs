//! Row-level permission rules
//!
//! Rules are resolved against a [`CallerContext`] into a
//! [`PermissionOutcome`]; the assembler ANDs a `Filter` outcome into every
//! query and rejects a `Deny` outcome before any SQL is built.

mod compiler;
mod context;
mod rules;

pub use compiler::{PermissionCompiler, PermissionOutcome};
pub use context::CallerContext;
pub use rules::{
    CallerValue, ContextResolver, LookupRule, LookupValue, PermissionRule, RuleResolution,
};
