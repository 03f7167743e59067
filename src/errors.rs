//! Plan error types
//!
//! Error codes:
//! - SEEK_UNKNOWN_OPERATOR (REJECT)
//! - SEEK_ATTRIBUTE_NOT_FOUND (REJECT)
//! - SEEK_ENTITY_NOT_FOUND (REJECT)
//! - SEEK_MALFORMED_CURSOR (REJECT)
//! - SEEK_INVALID_PAGINATION_ARGS (REJECT)
//! - SEEK_INVALID_FILTER_VALUE (REJECT)
//! - SEEK_ACCESS_DENIED (REJECT)
//! - SEEK_INVALID_IDENTIFIER (REJECT)
//!
//! Every error is a deterministic request-validation failure. Nothing here
//! is retried and no partial plan is ever produced alongside an error.

use std::fmt;

use thiserror::Error;

/// Severity levels for plan errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Errors raised while compiling a request into a plan
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// Operator outside the attribute's capability set or the vocabulary
    #[error("Unknown operator '{operator}' for attribute '{attribute}'")]
    UnknownOperator { attribute: String, operator: String },

    /// Filter or order references an undeclared attribute
    #[error("Attribute '{attribute}' not found on entity '{entity}'")]
    AttributeNotFound { entity: String, attribute: String },

    /// Entity missing from the catalog
    #[error("Entity '{0}' not found")]
    EntityNotFound(String),

    /// Cursor failed to decode or does not fit the active ordering
    #[error("Malformed cursor: {0}")]
    MalformedCursor(String),

    /// Conflicting or out-of-range first/last/offset
    #[error("Invalid pagination arguments: {0}")]
    InvalidPaginationArgs(String),

    /// Filter value has the wrong shape for its operator
    #[error("Invalid value for '{operator}' on '{attribute}': {reason}")]
    InvalidFilterValue {
        attribute: String,
        operator: String,
        reason: String,
    },

    /// No permission rule holds for the caller
    #[error("Access denied to entity '{0}'")]
    AccessDenied(String),

    /// Metadata carries a name that cannot be rendered safely
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

impl PlanError {
    pub fn unknown_operator(attribute: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnknownOperator {
            attribute: attribute.into(),
            operator: operator.into(),
        }
    }

    pub fn attribute_not_found(entity: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::AttributeNotFound {
            entity: entity.into(),
            attribute: attribute.into(),
        }
    }

    pub fn malformed_cursor(reason: impl Into<String>) -> Self {
        Self::MalformedCursor(reason.into())
    }

    pub fn invalid_pagination(reason: impl Into<String>) -> Self {
        Self::InvalidPaginationArgs(reason.into())
    }

    pub fn invalid_value(
        attribute: impl Into<String>,
        operator: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFilterValue {
            attribute: attribute.into(),
            operator: operator.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::UnknownOperator { .. } => "SEEK_UNKNOWN_OPERATOR",
            PlanError::AttributeNotFound { .. } => "SEEK_ATTRIBUTE_NOT_FOUND",
            PlanError::EntityNotFound(_) => "SEEK_ENTITY_NOT_FOUND",
            PlanError::MalformedCursor(_) => "SEEK_MALFORMED_CURSOR",
            PlanError::InvalidPaginationArgs(_) => "SEEK_INVALID_PAGINATION_ARGS",
            PlanError::InvalidFilterValue { .. } => "SEEK_INVALID_FILTER_VALUE",
            PlanError::AccessDenied(_) => "SEEK_ACCESS_DENIED",
            PlanError::InvalidIdentifier(_) => "SEEK_INVALID_IDENTIFIER",
        }
    }

    /// All plan errors reject the request
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

/// Result type for planning operations
pub type PlanResult<T> = Result<T, PlanError>;
