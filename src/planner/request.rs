//! Page requests
//!
//! `first`/`last` select the page size and scan direction, `after`/`before`
//! carry opaque cursors, `offset` skips rows in scan order on top of the
//! cursor bounds.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PlannerConfig;
use crate::errors::{PlanError, PlanResult};

/// Direction rows are read in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDirection {
    /// Requested order (`first`, or no size given)
    Forward,
    /// Reversed order (`last`); rows are flipped back afterwards
    Backward,
}

impl ScanDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanDirection::Forward => "forward",
            ScanDirection::Backward => "backward",
        }
    }
}

/// Pagination arguments of one connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub first: Option<i64>,
    #[serde(default)]
    pub last: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    /// Cursor namespace; defaults to the entity name
    #[serde(default)]
    pub scope: Option<String>,
}

/// Validated size, offset and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u64,
    pub offset: u64,
    pub direction: ScanDirection,
}

impl PageRequest {
    pub fn first(n: i64) -> Self {
        Self {
            first: Some(n),
            ..Default::default()
        }
    }

    pub fn last(n: i64) -> Self {
        Self {
            last: Some(n),
            ..Default::default()
        }
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Reads the pagination keys of a request object
    ///
    /// Unlike plain deserialization, a non-integer size or a non-string
    /// cursor is reported as `InvalidPaginationArgs`.
    pub fn from_value(request: &Value) -> PlanResult<Self> {
        let empty = serde_json::Map::new();
        let object = match request {
            Value::Object(object) => object,
            Value::Null => &empty,
            _ => return Err(PlanError::invalid_pagination("request must be an object")),
        };

        Ok(Self {
            after: string_arg(object.get("after"), "after")?,
            before: string_arg(object.get("before"), "before")?,
            first: integer_arg(object.get("first"), "first")?,
            last: integer_arg(object.get("last"), "last")?,
            offset: integer_arg(object.get("offset"), "offset")?,
            scope: string_arg(object.get("scope"), "scope")?,
        })
    }

    /// Cursor scope for an entity
    pub fn scope_for<'a>(&'a self, entity: &'a str) -> &'a str {
        self.scope.as_deref().unwrap_or(entity)
    }

    pub fn window(&self, config: &PlannerConfig) -> PlanResult<PageWindow> {
        let (size, direction) = match (self.first, self.last) {
            (Some(_), Some(_)) => {
                return Err(PlanError::invalid_pagination(
                    "'first' and 'last' cannot be combined",
                ))
            }
            (Some(n), None) => (Some(non_negative(n, "first")?), ScanDirection::Forward),
            (None, Some(n)) => (Some(non_negative(n, "last")?), ScanDirection::Backward),
            (None, None) => (None, ScanDirection::Forward),
        };

        if let Some(n) = size {
            if n > config.max_limit {
                return Err(PlanError::invalid_pagination(format!(
                    "page size {} exceeds the maximum of {}",
                    n, config.max_limit
                )));
            }
        }

        let offset = match self.offset {
            Some(n) => non_negative(n, "offset")?,
            None => 0,
        };

        Ok(PageWindow {
            limit: size.unwrap_or(config.default_limit),
            offset,
            direction,
        })
    }
}

fn non_negative(n: i64, name: &str) -> PlanResult<u64> {
    u64::try_from(n)
        .map_err(|_| PlanError::invalid_pagination(format!("'{}' must not be negative", name)))
}

fn integer_arg(value: Option<&Value>, name: &str) -> PlanResult<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| PlanError::invalid_pagination(format!("'{}' must be an integer", name))),
    }
}

fn string_arg(value: Option<&Value>, name: &str) -> PlanResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(PlanError::invalid_pagination(format!(
            "'{}' must be a string",
            name
        ))),
    }
}
